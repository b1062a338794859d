//! Offline step generator.

use async_trait::async_trait;

use super::client::{GenerationError, GenerationRequest, GeneratedStep, Phase, StepGenerator};
use crate::models::Audience;

/// Deterministic generator that fills a fixed outline with the goal's title.
///
/// Used by the command line, which has no content service to talk to.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateGenerator;

impl TemplateGenerator {
    fn individual(request: &GenerationRequest) -> Vec<GeneratedStep> {
        let title = request.goal_title.trim();
        let prefix = session_prefix(request);
        let activity = request.category.as_deref().unwrap_or("session");

        vec![
            GeneratedStep::new(format!("{prefix}Get ready for {title}"), Phase::Preparation)
                .with_description(format!("Lay out what the {activity} needs tonight."))
                .with_estimated_minutes(10),
            GeneratedStep::new(format!("{prefix}Start {title}"), Phase::Activation)
                .with_description("Begin at the planned time. Starting is the whole step.")
                .with_estimated_minutes(5),
            GeneratedStep::new(format!("{prefix}Note how {title} went"), Phase::FollowUp)
                .with_description("One sentence is enough.")
                .with_estimated_minutes(5),
        ]
    }

    fn supporter(request: &GenerationRequest) -> Vec<GeneratedStep> {
        let title = request.goal_title.trim();
        let prefix = session_prefix(request);

        vec![
            GeneratedStep::new(format!("{prefix}Check in before {title}"), Phase::Preparation)
                .with_description("A short message or a knock on the door.")
                .with_estimated_minutes(5),
            GeneratedStep::new(format!("{prefix}Be there for {title}"), Phase::Activation)
                .with_description("Help only where asked.")
                .with_estimated_minutes(30),
        ]
    }
}

fn session_prefix(request: &GenerationRequest) -> String {
    if request.total_occurrences > 1 {
        format!(
            "Week {}, Session {}: ",
            request.week_number, request.session_number
        )
    } else {
        String::new()
    }
}

#[async_trait]
impl StepGenerator for TemplateGenerator {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<Vec<GeneratedStep>, GenerationError> {
        if request.goal_title.trim().is_empty() {
            return Err(GenerationError::invalid_response("goal has no title"));
        }

        let mut steps = match request.audience {
            Audience::Individual => Self::individual(request),
            Audience::Supporter => Self::supporter(request),
        };
        for step in &mut steps {
            step.week_number = Some(request.week_number);
        }
        Ok(steps)
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;

    use super::*;
    use crate::models::SupportRole;

    fn request(audience: Audience, total_occurrences: usize) -> GenerationRequest {
        GenerationRequest {
            goal_id: 1,
            goal_title: "Evening walk".to_string(),
            category: Some("walk".to_string()),
            description: None,
            occurrence_index: 3,
            occurrence_start: Timestamp::UNIX_EPOCH,
            total_occurrences,
            week_number: 2,
            session_number: 1,
            frequency_per_week: Some(3),
            duration_weeks: 4,
            audience,
            support_role: SupportRole::HandsOn,
        }
    }

    #[tokio::test]
    async fn test_individual_outline() {
        let steps = TemplateGenerator
            .generate(&request(Audience::Individual, 12))
            .await
            .unwrap();

        let phases: Vec<Phase> = steps.iter().map(|s| s.phase).collect();
        assert_eq!(
            phases,
            vec![Phase::Preparation, Phase::Activation, Phase::FollowUp]
        );
        assert_eq!(steps[1].title, "Week 2, Session 1: Start Evening walk");
        assert!(steps.iter().all(|s| s.week_number == Some(2)));
    }

    #[tokio::test]
    async fn test_single_occurrence_has_no_prefix() {
        let steps = TemplateGenerator
            .generate(&request(Audience::Individual, 1))
            .await
            .unwrap();

        assert_eq!(steps[0].title, "Get ready for Evening walk");
    }

    #[tokio::test]
    async fn test_supporter_outline() {
        let steps = TemplateGenerator
            .generate(&request(Audience::Supporter, 12))
            .await
            .unwrap();

        assert_eq!(steps.len(), 2);
        assert!(steps[0].title.contains("Check in before"));
    }
}
