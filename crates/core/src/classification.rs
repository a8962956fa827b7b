//! Classification outcome and the guidance shown with it.

use serde::{Deserialize, Serialize};

/// One row of guidance: the topic and what to do about it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct GuidanceItem {
    pub topic: &'static str,
    pub advice: &'static str,
}

/// A titled guidance table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Guidance {
    pub heading: &'static str,
    pub items: &'static [GuidanceItem],
}

const SGA_GUIDANCE: Guidance = Guidance {
    heading: "Guidelines from ROCG",
    items: &[
        GuidanceItem {
            topic: "Fetal Growth Scan",
            advice: "Carry out every 2 weeks",
        },
        GuidanceItem {
            topic: "Umbilical Artery Doppler",
            advice: "Carry out every 2 weeks",
        },
        GuidanceItem {
            topic: "Consider Delivery",
            advice: "If static growth over 3 weeks, for period more than 34 weeks",
        },
        GuidanceItem {
            topic: "MCA Doppler",
            advice: "Carry out every 2 weeks (Only after 32 weeks)",
        },
    ],
};

const AGA_GUIDANCE: Guidance = Guidance {
    heading: "Pieces of General Advice",
    items: &[
        GuidanceItem {
            topic: "First Advice",
            advice: "Maintain balanced nutrition to support fetal development",
        },
        GuidanceItem {
            topic: "Second Advice",
            advice: "Encourage maternal hydration, appropriate physical activity, and regular \
                     prenatal care",
        },
        GuidanceItem {
            topic: "Third Advice",
            advice: "Avoid smoking, alcohol, or substance use during pregnancy",
        },
        GuidanceItem {
            topic: "Fourth Advice",
            advice: "Consult doctors immediately if there are any abnormalities",
        },
    ],
};

/// Fetal growth classification returned by the classification service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    AppropriateForGestationalAge,
    SmallForGestationalAge,
}

impl Classification {
    /// `0` is AGA; any other code is SGA.
    pub fn from_code(code: i64) -> Self {
        if code == 0 {
            Classification::AppropriateForGestationalAge
        } else {
            Classification::SmallForGestationalAge
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Classification::AppropriateForGestationalAge => 0,
            Classification::SmallForGestationalAge => 1,
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Classification::AppropriateForGestationalAge => "AGA",
            Classification::SmallForGestationalAge => "SGA",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Classification::AppropriateForGestationalAge => "Appropriate for Gestational Age",
            Classification::SmallForGestationalAge => "Small for Gestational Age",
        }
    }

    /// Banner text shown above the guidance.
    pub fn headline(&self) -> &'static str {
        match self {
            Classification::AppropriateForGestationalAge => {
                "It is predicted to be an Appropriate-for-Gestational-Age (AGA) baby."
            }
            Classification::SmallForGestationalAge => {
                "It is predicted to be a Small-for-Gestational-Age (SGA) baby."
            }
        }
    }

    pub fn guidance(&self) -> &'static Guidance {
        match self {
            Classification::AppropriateForGestationalAge => &AGA_GUIDANCE,
            Classification::SmallForGestationalAge => &SGA_GUIDANCE,
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.title(), self.abbreviation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_aga_with_general_advice() {
        let classification = Classification::from_code(0);
        assert_eq!(classification, Classification::AppropriateForGestationalAge);
        assert_eq!(classification.title(), "Appropriate for Gestational Age");
        assert_eq!(classification.guidance().heading, "Pieces of General Advice");
        assert_eq!(classification.guidance().items.len(), 4);
    }

    #[test]
    fn test_nonzero_is_sga_with_rocg_guidance() {
        for code in [1, 2, -1] {
            assert_eq!(
                Classification::from_code(code),
                Classification::SmallForGestationalAge
            );
        }

        let guidance = Classification::SmallForGestationalAge.guidance();
        assert_eq!(guidance.heading, "Guidelines from ROCG");
        let topics: Vec<&str> = guidance.items.iter().map(|item| item.topic).collect();
        assert_eq!(
            topics,
            vec![
                "Fetal Growth Scan",
                "Umbilical Artery Doppler",
                "Consider Delivery",
                "MCA Doppler"
            ]
        );
        assert!(guidance.items[2].advice.contains("34 weeks"));
        assert!(guidance.items[3].advice.contains("32 weeks"));
    }

    #[test]
    fn test_code_round_trips() {
        assert_eq!(Classification::SmallForGestationalAge.code(), 1);
        assert_eq!(
            Classification::from_code(i64::from(Classification::AppropriateForGestationalAge.code())),
            Classification::AppropriateForGestationalAge
        );
    }
}
