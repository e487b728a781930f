//! Per-pair diversity feature.

use crate::config::DiversityConfig;
use crate::models::{Candidate, Personality};

/// Diversity of a pair in [0, 100]; pure and symmetric.
pub fn pair_diversity(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let score = config.base
        + age_gap_component(a, b, config)
        + distance_component(a, b, config)
        + overlap_component(a, b, config)
        + lifestyle_component(a, b, config)
        + personality_component(a, b, config);
    score.clamp(0.0, 100.0)
}

fn age_gap_component(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let gap = a.age.abs_diff(b.age);
    if gap >= config.age_gap_high_years {
        -config.age_gap_penalty
    } else if gap >= config.age_gap_low_years {
        config.age_gap_bonus
    } else {
        0.0
    }
}

/// Each snapshot carries its distance from the requester, who carries 0.
fn distance_component(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let distance = a.distance_km.max(b.distance_km);
    if distance >= config.distance_high_km {
        -config.distance_penalty
    } else if distance >= config.distance_low_km {
        config.distance_bonus
    } else {
        0.0
    }
}

/// Jaccard overlap of interest sets in percent; two empty sets count as 0.
pub fn interest_jaccard_pct(a: &Candidate, b: &Candidate) -> f64 {
    let left = a.interest_set();
    let right = b.interest_set();
    let union = left.union(&right).count();
    if union == 0 {
        return 0.0;
    }
    left.intersection(&right).count() as f64 / union as f64 * 100.0
}

fn overlap_component(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let pct = interest_jaccard_pct(a, b);
    if pct < config.overlap_low_pct {
        -config.overlap_low_penalty
    } else if pct > config.overlap_high_pct {
        -config.overlap_high_penalty
    } else {
        config.overlap_bonus
    }
}

fn lifestyle_component(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let left = a.lifestyle_set();
    let right = b.lifestyle_set();
    let shared = left.intersection(&right).count();
    let differing = left.symmetric_difference(&right).count();
    if shared == 0 || differing == 0 {
        return 0.0;
    }
    (differing as f64 * config.lifestyle_points_per_tag).min(config.lifestyle_cap)
}

fn personality_component(a: &Candidate, b: &Candidate, config: &DiversityConfig) -> f64 {
    let bonus = match (a.personality, b.personality) {
        (Some(Personality::Introvert), Some(Personality::Extrovert))
        | (Some(Personality::Extrovert), Some(Personality::Introvert)) => {
            config.personality_opposite_bonus
        }
        (Some(Personality::Ambivert), Some(other)) | (Some(other), Some(Personality::Ambivert))
            if other != Personality::Ambivert =>
        {
            config.personality_ambivert_bonus
        }
        _ => 0.0,
    };
    bonus.min(config.personality_cap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Interest;
    use uuid::Uuid;

    fn person(age: u32) -> Candidate {
        Candidate::new(Uuid::new_v4(), age)
    }

    #[test]
    fn test_baseline_with_no_interests() {
        let config = DiversityConfig::default();
        // base 50, empty interests count as 0 % overlap
        assert_eq!(pair_diversity(&person(30), &person(31), &config), 45.0);
    }

    #[test]
    fn test_age_gap_monotonicity() {
        let config = DiversityConfig::default();
        let viewer = person(25);
        let ten = pair_diversity(&viewer, &person(35), &config);
        let twenty = pair_diversity(&viewer, &person(45), &config);
        assert!(ten >= twenty);
        assert_eq!(ten - twenty, 20.0);
    }

    #[test]
    fn test_distance_uses_larger_snapshot() {
        let config = DiversityConfig::default();
        let viewer = person(30);
        let mut near = person(30);
        near.distance_km = 2.0;
        let mut mid = person(30);
        mid.distance_km = 12.0;
        let mut far = person(30);
        far.distance_km = 80.0;
        assert_eq!(pair_diversity(&viewer, &near, &config), 45.0);
        assert_eq!(pair_diversity(&viewer, &mid, &config), 60.0);
        assert_eq!(pair_diversity(&mid, &viewer, &config), 60.0);
        assert_eq!(pair_diversity(&viewer, &far, &config), 40.0);
    }

    #[test]
    fn test_overlap_buckets() {
        let config = DiversityConfig::default();
        let mut a = person(30);
        let mut b = person(30);
        a.interests = vec![Interest::new("hiking", "outdoors"), Interest::new("jazz", "music")];
        b.interests = vec![Interest::new("hiking", "outdoors"), Interest::new("chess", "games")];
        // 1 / 3 shared
        assert!((interest_jaccard_pct(&a, &b) - 33.333).abs() < 1e-2);
        assert_eq!(pair_diversity(&a, &b, &config), 70.0);

        b.interests = a.interests.clone();
        assert_eq!(pair_diversity(&a, &b, &config), 40.0);
    }

    #[test]
    fn test_lifestyle_complementarity() {
        let config = DiversityConfig::default();
        let mut a = person(30);
        let mut b = person(30);
        a.lifestyle = vec!["Vegan".to_string(), "runner".to_string()];
        b.lifestyle = vec!["vegan".to_string(), "night owl".to_string(), "gamer".to_string()];
        // shares "vegan", differs on three tags, capped at 10
        assert_eq!(lifestyle_component(&a, &b, &config), 10.0);

        b.lifestyle = vec!["smoker".to_string()];
        assert_eq!(lifestyle_component(&a, &b, &config), 0.0);

        b.lifestyle = a.lifestyle.clone();
        assert_eq!(lifestyle_component(&a, &b, &config), 0.0);
    }

    #[test]
    fn test_personality_complementarity() {
        let config = DiversityConfig::default();
        let mut a = person(30);
        let mut b = person(30);
        a.personality = Some(Personality::Introvert);
        b.personality = Some(Personality::Extrovert);
        assert_eq!(personality_component(&a, &b, &config), 10.0);
        b.personality = Some(Personality::Ambivert);
        assert_eq!(personality_component(&a, &b, &config), 5.0);
        a.personality = Some(Personality::Ambivert);
        assert_eq!(personality_component(&a, &b, &config), 0.0);
        b.personality = None;
        assert_eq!(personality_component(&a, &b, &config), 0.0);
    }

    #[test]
    fn test_result_is_clamped() {
        let mut config = DiversityConfig::default();
        config.base = 95.0;
        let mut a = person(25);
        let mut b = person(32);
        a.personality = Some(Personality::Introvert);
        b.personality = Some(Personality::Extrovert);
        b.distance_km = 10.0;
        assert_eq!(pair_diversity(&a, &b, &config), 100.0);
    }
}
