use crate::models::{Problem, ProblemLevel, SolutionStep};

pub const STAR_PENTAGON_ID: &str = "star-pentagon";
pub const QUADRATIC_ROOTS_ID: &str = "quadratic-roots";

fn step(number: u32, hint: &str, explanation: &str, formula: Option<&str>) -> SolutionStep {
    SolutionStep {
        step: number,
        hint: hint.to_string(),
        explanation: explanation.to_string(),
        formula: formula.map(str::to_string),
        visual_description: None,
    }
}

/// Problems every fresh store starts with
pub fn seed_problems() -> Vec<Problem> {
    let now = Problem::timestamp();
    vec![
        Problem {
            id: STAR_PENTAGON_ID.to_string(),
            title: "Interior angle sum of a star pentagon".to_string(),
            description: "Join the vertices of a regular pentagon to form a star pentagon. \
                          Find the sum of the five angles at the tips of the star."
                .to_string(),
            level: ProblemLevel::HighSchool,
            category: "geometry".to_string(),
            theorems: vec!["polygon-angle-sum".to_string(), "triangle-angle-sum".to_string()],
            keywords: vec![
                "star pentagon".to_string(),
                "interior angles".to_string(),
                "geometry".to_string(),
            ],
            solution_steps: vec![
                SolutionStep {
                    visual_description: Some(
                        "Shade the five small triangles that form the tips of the star.".to_string(),
                    ),
                    ..step(
                        1,
                        "Look at the triangles formed at the tips of the star.",
                        "Each tip of the star, together with one side of the inner pentagon, forms a triangle.",
                        None,
                    )
                },
                step(
                    2,
                    "What is the interior angle sum of the inner pentagon?",
                    "(5 - 2) × 180° = 540°, so each angle of the regular inner pentagon is 108°.",
                    Some("(n - 2) × 180°"),
                ),
                step(
                    3,
                    "Find the base angles of each tip triangle.",
                    "Each base angle is supplementary to an inner pentagon angle: 180° - 108° = 72°.",
                    Some("180° - 108° = 72°"),
                ),
                step(
                    4,
                    "Now find the angle at each tip and add the five of them.",
                    "Each tip angle is 180° - 2 × 72° = 36°, so the five tip angles sum to 5 × 36° = 180°.",
                    Some("5 × 36° = 180°"),
                ),
            ],
            created_at: now,
            updated_at: now,
            image_url: None,
            video_url: None,
        },
        Problem {
            id: QUADRATIC_ROOTS_ID.to_string(),
            title: "Roots of a quadratic equation".to_string(),
            description: "Solve $x^2 - 5x + 6 = 0$.".to_string(),
            level: ProblemLevel::MiddleSchool,
            category: "algebra".to_string(),
            theorems: vec!["zero-product-property".to_string()],
            keywords: vec!["quadratic".to_string(), "factoring".to_string()],
            solution_steps: vec![
                step(
                    1,
                    "Look for two numbers whose product is 6 and whose sum is -5.",
                    "Factoring a monic quadratic means finding r and s with r × s = c and r + s = b.",
                    None,
                ),
                step(
                    2,
                    "Write the quadratic as a product of two factors.",
                    "-2 and -3 work, so the equation becomes (x - 2)(x - 3) = 0.",
                    Some("(x - 2)(x - 3) = 0"),
                ),
                step(
                    3,
                    "When is a product equal to zero?",
                    "A product is zero exactly when one factor is zero, so x = 2 or x = 3.",
                    Some("x = 2, x = 3"),
                ),
            ],
            created_at: now,
            updated_at: now,
            image_url: None,
            video_url: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_steps_are_contiguous_from_one() {
        for problem in seed_problems() {
            assert!(!problem.solution_steps.is_empty());
            for (index, s) in problem.solution_steps.iter().enumerate() {
                assert_eq!(s.step as usize, index + 1, "problem {}", problem.id);
            }
        }
    }
}
