use crate::config::Config;
use crate::services::{AdvisorError, BookAdvisor, advisor_from_config};

pub async fn cmd_recommend(config: &Config, mood: &str) -> anyhow::Result<()> {
    let advisor = advisor_from_config(config);

    match advisor.recommend(mood).await {
        Ok(text) => {
            println!("Recommendations");
            println!("{:-<60}", "");
            println!("{text}");
            Ok(())
        }
        Err(AdvisorError::Validation(message)) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn cmd_describe(config: &Config, title: &str) -> anyhow::Result<()> {
    let advisor = advisor_from_config(config);

    match advisor.describe(title).await {
        Ok(text) => {
            println!("About '{title}'");
            println!("{:-<60}", "");
            println!("{text}");
            Ok(())
        }
        Err(AdvisorError::Validation(message)) => {
            println!("{message}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
