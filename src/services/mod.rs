pub mod advisor_service;
pub mod advisor_service_impl;
pub use advisor_service::{AdvisorError, BookAdvisor};
pub use advisor_service_impl::{FallbackAdvisor, StaticAdvisor, advisor_from_config};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, RegisterRequest, Registration, UserProfile};
pub use auth_service_impl::JsonAuthService;

pub mod fine;
pub use fine::calculate_fine;

pub mod image;
pub use image::ProfileImageService;

pub mod library_service;
pub mod library_service_impl;
pub use library_service::{
    BorrowReceipt, CatalogEntry, LibraryError, LibraryService, LoanView, NewBook, OpenLoanView,
    ReturnSummary,
};
pub use library_service_impl::JsonLibraryService;
