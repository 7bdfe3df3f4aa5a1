//! Static pillar/task tables for the deterministic generator.
//!
//! The tables are `static` data, read-only for the life of the process.

use super::classifier::TemplateSetId;
use super::{PILLAR_COUNT, TASKS_PER_PILLAR};

/// A named pillar with its eight tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PillarTemplate {
    pub name: &'static str,
    pub tasks: [&'static str; TASKS_PER_PILLAR],
}

/// Eight pillar templates, in grid order.
pub type TemplateSet = [PillarTemplate; PILLAR_COUNT];

/// Look up a template set.
pub fn resolve(id: TemplateSetId) -> &'static TemplateSet {
    match id {
        TemplateSetId::Marathon => &MARATHON,
        TemplateSetId::Generic => &GENERIC,
    }
}

pub static GENERIC: TemplateSet = [
    PillarTemplate {
        name: "Skills & Knowledge",
        tasks: [
            "List the 5 core skills this goal requires",
            "Read one book on the subject each month",
            "Take an online course and finish every module",
            "Practice the hardest skill for 30 min daily",
            "Find a mentor who has reached this goal",
            "Keep a learning journal with weekly notes",
            "Teach what you learned to someone else",
            "Review progress against the skill list monthly",
        ],
    },
    PillarTemplate {
        name: "Physical Health",
        tasks: [
            "Sleep 7-8 hours every night",
            "Exercise at least 3x per week",
            "Drink 2 liters of water daily",
            "Eat vegetables with every main meal",
            "Walk 8,000 steps per day",
            "Stretch for 10 minutes each morning",
            "Book an annual health check-up",
            "Limit caffeine after 2 pm",
        ],
    },
    PillarTemplate {
        name: "Mental & Emotional",
        tasks: [
            "Meditate for 10 minutes each day",
            "Write down 3 things you are grateful for",
            "Name your biggest fear about this goal",
            "Reframe one setback per week as a lesson",
            "Schedule one screen-free evening weekly",
            "Celebrate every milestone you reach",
            "Talk to a friend when motivation drops",
            "Visualize reaching the goal before sleep",
        ],
    },
    PillarTemplate {
        name: "Time Management",
        tasks: [
            "Block 1 focused hour for the goal daily",
            "Plan the week every Sunday evening",
            "Track where your time goes for one week",
            "Remove one low-value commitment",
            "Use a single task list for everything",
            "Set a deadline for each milestone",
            "Batch small errands into one slot",
            "Review the calendar every Friday",
        ],
    },
    PillarTemplate {
        name: "Resources & Tools",
        tasks: [
            "Set a monthly budget for the goal",
            "List the tools and equipment you need",
            "Acquire the single most important tool first",
            "Organize a dedicated workspace",
            "Find free resources before buying",
            "Automate one repetitive task",
            "Back up your work every week",
            "Review spending against budget monthly",
        ],
    },
    PillarTemplate {
        name: "Network & Support",
        tasks: [
            "Tell 3 people about your goal",
            "Join a community working on the same goal",
            "Find an accountability partner",
            "Attend one related event per month",
            "Share progress publicly every two weeks",
            "Ask an expert one specific question",
            "Offer help to someone a step behind you",
            "Thank your supporters regularly",
        ],
    },
    PillarTemplate {
        name: "Strategy & Planning",
        tasks: [
            "Write the goal as one measurable sentence",
            "Set a target completion date",
            "Break the goal into quarterly milestones",
            "Define the first three concrete actions",
            "Identify the biggest risk and a backup plan",
            "Measure progress with one key number",
            "Run a monthly review of what worked",
            "Adjust the plan after each milestone",
        ],
    },
    PillarTemplate {
        name: "Environment & Habits",
        tasks: [
            "Remove one distraction from your space",
            "Attach the goal habit to a daily routine",
            "Prepare tomorrow's materials the night before",
            "Keep a visible progress tracker",
            "Start each day with the hardest task",
            "Build a 30-day habit streak",
            "Replace one bad habit with a good one",
            "Audit your habits every quarter",
        ],
    },
];

pub static MARATHON: TemplateSet = [
    PillarTemplate {
        name: "Base Building",
        tasks: [
            "Run 3x per week, 30-45 min easy pace",
            "Increase weekly mileage by no more than 10%",
            "Add a fourth easy run after week 4",
            "Keep 80% of runs at conversational pace",
            "Build the long run to 90 minutes",
            "Run on varied terrain once a week",
            "Reach 30 miles per week consistently",
            "Hold peak base volume for 3 weeks",
        ],
    },
    PillarTemplate {
        name: "Long Runs",
        tasks: [
            "Schedule the long run on the same day weekly",
            "Extend the long run by 1 mile each week",
            "Practice race-day fueling on long runs",
            "Run the last 2 miles at marathon pace",
            "Complete a 16-mile long run",
            "Complete an 18-mile long run",
            "Complete a 20-mile long run",
            "Take a cutback week every 4th week",
        ],
    },
    PillarTemplate {
        name: "Speed Work",
        tasks: [
            "Add strides after two easy runs per week",
            "Run one tempo session weekly",
            "Do 6 x 800m intervals at 10K pace",
            "Run a progression run every two weeks",
            "Do 5 x 1 mile at half-marathon pace",
            "Run hill repeats once a week",
            "Race a 10K as a fitness check",
            "Run 10 miles at goal marathon pace",
        ],
    },
    PillarTemplate {
        name: "Strength & Mobility",
        tasks: [
            "Do 20 min of strength work twice a week",
            "Add single-leg squats and lunges",
            "Train core with planks 3x per week",
            "Foam roll after every run",
            "Stretch hips and calves daily",
            "Add calf raises to prevent injury",
            "Book a monthly sports massage",
            "Do a mobility routine before long runs",
        ],
    },
    PillarTemplate {
        name: "Nutrition & Fueling",
        tasks: [
            "Eat a carb-rich meal before long runs",
            "Drink 500ml of water with electrolytes daily",
            "Test energy gels during training runs",
            "Take in 60g of carbs per hour on long runs",
            "Eat protein within 30 min after runs",
            "Plan the race-week carb load",
            "Practice the race breakfast twice",
            "Finalize the race-day fueling plan",
        ],
    },
    PillarTemplate {
        name: "Recovery & Sleep",
        tasks: [
            "Sleep 8 hours on training nights",
            "Take one full rest day per week",
            "Track resting heart rate each morning",
            "Ice or compress sore areas after hard sessions",
            "Walk 20 minutes on rest days",
            "Skip a run when pain lasts over 2 days",
            "Take an easy week when fatigue builds",
            "Nap 20 minutes after long runs",
        ],
    },
    PillarTemplate {
        name: "Gear & Logistics",
        tasks: [
            "Get fitted for running shoes",
            "Buy a second pair to rotate",
            "Choose anti-chafe race clothing",
            "Register for the race early",
            "Book travel and lodging near the start",
            "Test the full race outfit on a long run",
            "Plan the route to the start line",
            "Pack the race bag two days before",
        ],
    },
    PillarTemplate {
        name: "Race Strategy",
        tasks: [
            "Set a goal pace for sub-4 hours (9:09/mile)",
            "Study the course elevation profile",
            "Plan even splits for each 5K",
            "Taper mileage over the final 3 weeks",
            "Visualize each segment of the race",
            "Start the first 10K slightly conservative",
            "Use aid stations on a planned schedule",
            "Push the pace only after mile 20",
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generic_categories_in_order() {
        let names: Vec<&str> = resolve(TemplateSetId::Generic)
            .iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "Skills & Knowledge",
                "Physical Health",
                "Mental & Emotional",
                "Time Management",
                "Resources & Tools",
                "Network & Support",
                "Strategy & Planning",
                "Environment & Habits",
            ]
        );
    }

    #[test]
    fn test_marathon_first_pillar() {
        let set = resolve(TemplateSetId::Marathon);
        assert_eq!(set[0].name, "Base Building");
        assert_eq!(set[0].tasks[0], "Run 3x per week, 30-45 min easy pace");
    }

    #[test]
    fn test_no_blank_or_duplicate_entries() {
        for id in [TemplateSetId::Generic, TemplateSetId::Marathon] {
            let set = resolve(id);
            let names: HashSet<&str> = set.iter().map(|p| p.name).collect();
            assert_eq!(names.len(), PILLAR_COUNT, "duplicate pillar in {}", id);
            for pillar in set.iter() {
                let tasks: HashSet<&str> = pillar.tasks.iter().copied().collect();
                assert_eq!(tasks.len(), TASKS_PER_PILLAR, "duplicate task in {}", pillar.name);
                assert!(pillar.tasks.iter().all(|t| !t.trim().is_empty()));
            }
        }
    }
}
