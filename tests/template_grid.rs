//! Property tests for the deterministic template generator.

use proptest::prelude::*;

use harada::grid::{classify, validate_shape, TemplateSetId, PILLAR_COUNT, TASKS_PER_PILLAR};
use harada::TemplateGenerator;

proptest! {
    #[test]
    fn any_non_blank_goal_yields_full_grid(goal in "[ -~]{0,40}[a-zA-Z][ -~]{0,40}") {
        let draft = TemplateGenerator::new().generate_sync(&goal).unwrap();

        prop_assert!(validate_shape(&draft).is_ok());
        prop_assert_eq!(draft.pillars.len(), PILLAR_COUNT);
        prop_assert_eq!(draft.task_count(), PILLAR_COUNT * TASKS_PER_PILLAR);

        for (index, pillar) in draft.pillars.iter().enumerate() {
            prop_assert_eq!(pillar.position as usize, index + 1);
            prop_assert!(!pillar.pillar_text.trim().is_empty());
            for (task_index, task) in pillar.tasks.iter().enumerate() {
                prop_assert_eq!(task.position as usize, task_index + 1);
                prop_assert!(!task.task_text.trim().is_empty());
            }
        }
    }

    #[test]
    fn marathon_keyword_selects_marathon_set(prefix in "[a-z ]{0,20}", suffix in "[a-z ]{0,20}") {
        let goal = format!("{}MARATHON{}", prefix, suffix);
        prop_assert_eq!(classify(&goal), TemplateSetId::Marathon);

        let draft = TemplateGenerator::new().generate_sync(&goal).unwrap();
        prop_assert_eq!(draft.pillars[0].pillar_text.as_str(), "Base Building");
    }

    #[test]
    fn blank_goal_is_rejected(goal in "[ \t\n]{0,10}") {
        let err = TemplateGenerator::new().generate_sync(&goal).unwrap_err();
        prop_assert!(err.is_validation());
    }
}
