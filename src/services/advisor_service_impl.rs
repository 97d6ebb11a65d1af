//! Built-in and composite implementations of [`BookAdvisor`].

use crate::clients::gemini::GeminiClient;
use crate::config::Config;
use crate::services::advisor_service::{AdvisorError, BookAdvisor, require_text};
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use std::fmt::Write;
use tracing::{info, warn};

/// Suggested reads per mood, in lookup order.
pub static MOOD_TABLE: [(&str, [(&str, &str); 3]); 6] = [
    (
        "happy",
        [
            ("The Happiness Project", "Gretchen Rubin"),
            ("Born a Crime", "Trevor Noah"),
            ("The House in the Cerulean Sea", "TJ Klune"),
        ],
    ),
    (
        "sad",
        [
            ("When Things Fall Apart", "Pema Chödrön"),
            ("Man's Search for Meaning", "Viktor E. Frankl"),
            ("The Boy, the Mole, the Fox and the Horse", "Charlie Mackesy"),
        ],
    ),
    (
        "anxious",
        [
            ("Dare", "Barry McDonagh"),
            ("The Worry Trick", "David Carbonell"),
            ("Hope and Help for Your Nerves", "Claire Weekes"),
        ],
    ),
    (
        "bored",
        [
            ("Ready Player One", "Ernest Cline"),
            ("The Night Circus", "Erin Morgenstern"),
            ("Dark Matter", "Blake Crouch"),
        ],
    ),
    (
        "inspired",
        [
            ("Atomic Habits", "James Clear"),
            ("Educated", "Tara Westover"),
            ("Becoming", "Michelle Obama"),
        ],
    ),
    (
        "relaxed",
        [
            ("The Thursday Murder Club", "Richard Osman"),
            ("The Midnight Library", "Matt Haig"),
            ("Project Hail Mary", "Andy Weir"),
        ],
    ),
];

/// Canned summaries, in lookup order.
pub static BOOK_INFO_TABLE: [(&str, &str); 4] = [
    (
        "To Kill a Mockingbird",
        "A powerful story about racial injustice in the American South during the 1930s, told through the eyes of a young girl named Scout Finch. Her father, lawyer Atticus Finch, defends a Black man falsely accused of raping a white woman. The novel explores themes of moral growth, compassion, and justice.",
    ),
    (
        "1984",
        "George Orwell's dystopian classic depicts a totalitarian society where the government, led by Big Brother, controls every aspect of citizens' lives including their thoughts. The protagonist Winston Smith rebels by keeping a diary and falling in love. The novel introduced concepts like 'thoughtcrime,' 'doublethink,' and 'Newspeak' that remain relevant in discussions about surveillance and authoritarianism.",
    ),
    (
        "Pride and Prejudice",
        "Jane Austen's beloved novel follows Elizabeth Bennet as she navigates issues of manners, upbringing, and marriage in 19th-century England. When she meets the wealthy, proud Mr. Darcy, their mutual prejudices create a series of misunderstandings before they eventually overcome their pride to find love and understanding.",
    ),
    (
        "The Hobbit",
        "J.R.R. Tolkien's fantasy adventure follows Bilbo Baggins, a comfort-loving hobbit who reluctantly joins a quest with thirteen dwarves to reclaim their mountain home from the dragon Smaug. Throughout his journey, Bilbo discovers courage, wisdom, and a magical ring that will later become central to 'The Lord of the Rings'.",
    ),
];

type MoodEntry = (&'static str, [(&'static str, &'static str); 3]);

/// Answers from the built-in tables. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAdvisor;

impl StaticAdvisor {
    /// Picks the table entry for a mood: exact key, then a key contained in
    /// the mood (or the other way round).
    #[must_use]
    pub fn match_mood(mood: &str) -> Option<&'static MoodEntry> {
        MOOD_TABLE
            .iter()
            .find(|(key, _)| *key == mood)
            .or_else(|| {
                MOOD_TABLE
                    .iter()
                    .find(|(key, _)| mood.contains(key) || key.contains(mood))
            })
    }

    #[must_use]
    pub fn recommendations_for(mood: &str) -> String {
        let mood = mood.to_lowercase();

        let (_, books) = Self::match_mood(&mood)
            .or_else(|| MOOD_TABLE.choose(&mut rand::rng()))
            .unwrap_or(&MOOD_TABLE[0]);

        let mut out = format!("Based on your mood '{mood}', here are some recommendations:\n\n");
        for (i, (title, author)) in books.iter().enumerate() {
            let _ = writeln!(out, "{}. '{title}' by {author}", i + 1);
        }
        out
    }

    #[must_use]
    pub fn info_for(title: &str) -> String {
        let needle = title.to_lowercase();

        BOOK_INFO_TABLE
            .iter()
            .find(|(known, _)| {
                let known = known.to_lowercase();
                known.contains(&needle) || needle.contains(&known)
            })
            .map_or_else(
                || {
                    format!(
                        "Information about '{title}' is not available in our local database. \
                         This book might be newer or less well-known. Consider checking online \
                         resources like Goodreads or Google Books for more information."
                    )
                },
                |(_, info)| (*info).to_string(),
            )
    }
}

#[async_trait]
impl BookAdvisor for StaticAdvisor {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn recommend(&self, mood: &str) -> Result<String, AdvisorError> {
        Ok(Self::recommendations_for(mood))
    }

    async fn describe(&self, title: &str) -> Result<String, AdvisorError> {
        Ok(Self::info_for(title))
    }
}

/// Tries the remote advisor first and answers from [`StaticAdvisor`] when it
/// is absent or fails.
pub struct FallbackAdvisor {
    primary: Option<Box<dyn BookAdvisor>>,
    fallback: StaticAdvisor,
}

impl FallbackAdvisor {
    #[must_use]
    pub fn new(primary: Option<Box<dyn BookAdvisor>>) -> Self {
        Self {
            primary,
            fallback: StaticAdvisor,
        }
    }

    #[must_use]
    pub fn offline() -> Self {
        Self::new(None)
    }

    #[must_use]
    pub fn has_remote(&self) -> bool {
        self.primary.is_some()
    }
}

#[async_trait]
impl BookAdvisor for FallbackAdvisor {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn recommend(&self, mood: &str) -> Result<String, AdvisorError> {
        let mood = require_text(mood, "your mood")?;

        if let Some(primary) = &self.primary {
            match primary.recommend(mood).await {
                Ok(text) => return Ok(text),
                Err(e) => warn!(advisor = primary.name(), error = %e, "Recommendation failed, using local table"),
            }
        }

        info!(advisor = self.fallback.name(), "Answering recommendation locally");
        self.fallback.recommend(mood).await
    }

    async fn describe(&self, title: &str) -> Result<String, AdvisorError> {
        let title = require_text(title, "a book title")?;

        if let Some(primary) = &self.primary {
            match primary.describe(title).await {
                Ok(text) => return Ok(text),
                Err(e) => warn!(advisor = primary.name(), error = %e, "Book lookup failed, using local table"),
            }
        }

        info!(advisor = self.fallback.name(), "Answering book lookup locally");
        self.fallback.describe(title).await
    }
}

/// Builds the advisor described by `config`: Gemini in front of the local
/// tables when enabled and a key is available, the tables alone otherwise.
#[must_use]
pub fn advisor_from_config(config: &Config) -> FallbackAdvisor {
    if !config.ai.enabled {
        return FallbackAdvisor::offline();
    }

    let Some(api_key) = config.ai.resolve_api_key() else {
        info!(env = %config.ai.api_key_env, "No text-generation API key found, using local tables");
        return FallbackAdvisor::offline();
    };

    match GeminiClient::new(&config.ai, api_key) {
        Ok(client) => FallbackAdvisor::new(Some(Box::new(client))),
        Err(e) => {
            warn!(error = %e, "Failed to build text-generation client, using local tables");
            FallbackAdvisor::offline()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct BrokenAdvisor {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BookAdvisor for BrokenAdvisor {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn recommend(&self, _mood: &str) -> Result<String, AdvisorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AdvisorError::NotConfigured)
        }

        async fn describe(&self, _title: &str) -> Result<String, AdvisorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AdvisorError::EmptyResponse {
                model: "test".to_string(),
            })
        }
    }

    struct CannedAdvisor;

    #[async_trait]
    impl BookAdvisor for CannedAdvisor {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn recommend(&self, mood: &str) -> Result<String, AdvisorError> {
            Ok(format!("remote:{mood}"))
        }

        async fn describe(&self, title: &str) -> Result<String, AdvisorError> {
            Ok(format!("remote:{title}"))
        }
    }

    #[test]
    fn happy_lists_the_three_configured_titles() {
        let text = StaticAdvisor::recommendations_for("Happy");
        assert_eq!(
            text,
            "Based on your mood 'happy', here are some recommendations:\n\n\
             1. 'The Happiness Project' by Gretchen Rubin\n\
             2. 'Born a Crime' by Trevor Noah\n\
             3. 'The House in the Cerulean Sea' by TJ Klune\n"
        );
    }

    #[test]
    fn partial_mood_matches_by_substring() {
        let text = StaticAdvisor::recommendations_for("a bit anxious today");
        assert!(text.contains("'Dare' by Barry McDonagh"));

        let text = StaticAdvisor::recommendations_for("bore");
        assert!(text.contains("'Ready Player One' by Ernest Cline"));
    }

    #[test]
    fn unknown_mood_still_gets_three_titles() {
        let text = StaticAdvisor::recommendations_for("xyzzy");
        assert!(text.starts_with("Based on your mood 'xyzzy'"));
        let listed = MOOD_TABLE.iter().any(|(_, books)| {
            books
                .iter()
                .all(|(title, author)| text.contains(&format!("'{title}' by {author}")))
        });
        assert!(listed);
        assert_eq!(text.lines().filter(|l| l.starts_with(char::is_numeric)).count(), 3);
    }

    #[test]
    fn describe_matches_either_direction() {
        assert_eq!(StaticAdvisor::info_for("1984"), BOOK_INFO_TABLE[1].1);
        assert_eq!(StaticAdvisor::info_for("hobbit"), BOOK_INFO_TABLE[3].1);
        assert_eq!(
            StaticAdvisor::info_for("Pride and Prejudice (Annotated)"),
            BOOK_INFO_TABLE[2].1
        );
    }

    #[test]
    fn describe_unknown_title_points_elsewhere() {
        let text = StaticAdvisor::info_for("Unknown Book XYZ");
        assert!(text.starts_with(
            "Information about 'Unknown Book XYZ' is not available in our local database."
        ));
        assert!(text.contains("Goodreads"));
    }

    #[tokio::test]
    async fn failing_primary_falls_back_to_tables() {
        let advisor = FallbackAdvisor::new(Some(Box::new(BrokenAdvisor {
            calls: AtomicUsize::new(0),
        })));

        let text = advisor.recommend("happy").await.unwrap();
        assert!(text.contains("The Happiness Project"));

        let text = advisor.describe("1984").await.unwrap();
        assert_eq!(text, BOOK_INFO_TABLE[1].1);
    }

    #[tokio::test]
    async fn working_primary_wins() {
        let advisor = FallbackAdvisor::new(Some(Box::new(CannedAdvisor)));
        assert!(advisor.has_remote());
        assert_eq!(advisor.recommend("sad").await.unwrap(), "remote:sad");
        assert_eq!(advisor.describe("Dune").await.unwrap(), "remote:Dune");
    }

    #[tokio::test]
    async fn blank_input_is_rejected_before_any_backend() {
        let advisor = FallbackAdvisor::offline();
        assert!(matches!(
            advisor.recommend("   ").await,
            Err(AdvisorError::Validation(_))
        ));
        assert!(matches!(
            advisor.describe("").await,
            Err(AdvisorError::Validation(_))
        ));
    }

    #[test]
    fn disabled_ai_builds_offline_advisor() {
        let mut config = Config::default();
        config.ai.enabled = false;
        config.ai.api_key = Some("key".to_string());
        assert!(!advisor_from_config(&config).has_remote());
    }

    #[test]
    fn configured_key_builds_remote_advisor() {
        let mut config = Config::default();
        config.ai.api_key = Some("key".to_string());
        assert!(advisor_from_config(&config).has_remote());
    }
}
