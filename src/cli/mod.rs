//! CLI module - Command-line interface for Libris
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Libris - Library Management
/// Catalog, circulation and late fines backed by JSON files
#[derive(Parser)]
#[command(name = "libris")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Username to act as
    #[arg(long, short = 'u', global = true, env = "LIBRIS_USER")]
    pub user: Option<String>,

    /// Password for --user
    #[arg(long, short = 'p', global = true, env = "LIBRIS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    #[must_use]
    pub fn credentials(&self) -> Credentials<'_> {
        Credentials {
            user: self.user.as_deref(),
            password: self.password.as_deref(),
        }
    }
}

/// Login details taken from flags or the environment.
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    pub user: Option<&'a str>,
    pub password: Option<&'a str>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create default config file and seed the data directory
    #[command(alias = "--init")]
    Init,

    /// Create a new member account
    Register {
        username: String,
        password: String,
        /// Profile picture to copy (.jpg, .jpeg or .png)
        #[arg(long)]
        picture: Option<PathBuf>,
    },

    /// Show the logged-in account
    Whoami,

    /// List all books with availability
    #[command(alias = "ls")]
    Books,

    /// Borrow a book
    #[command(alias = "b")]
    Borrow {
        /// Book ID, e.g. B001
        book_id: String,
    },

    /// Show your borrowed books
    Loans,

    /// Suggest books for a mood
    #[command(alias = "rec")]
    Recommend {
        #[arg(required = true)]
        mood: Vec<String>,
    },

    /// Summarize a book by title
    Describe {
        #[arg(required = true)]
        title: Vec<String>,
    },

    /// Add a book to the catalog (admin)
    AddBook {
        book_id: String,
        title: String,
        author: String,
        genre: String,
    },

    /// List every unreturned book (admin)
    Returns,

    /// Process a return and charge any fine (admin)
    Return { username: String, book_id: String },

    /// Recompute availability flags from open loans (admin)
    Reconcile,
}

pub use commands::*;
