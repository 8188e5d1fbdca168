//! Marketing health score derived from the channel answers of a record.

use super::catalog;
use super::domain::{SurveyField, SurveyRecord};

const STRONG_POINTS: u32 = 2;
const MODERATE_POINTS: u32 = 1;
const MAX_POINTS: u32 = SurveyField::SCORED.len() as u32 * STRONG_POINTS;

/// Point value of each catalog option that earns credit. Catalog options not
/// listed here are worth nothing.
const SCORE_TABLE: &[(SurveyField, &str, u32)] = &[
    (SurveyField::AttractivePhotos, "매우 잘 되어있음", 2),
    (SurveyField::AttractivePhotos, "보통", 1),
    (SurveyField::ReservationFeature, "활발히 사용", 2),
    (SurveyField::ReservationFeature, "가끔 사용", 1),
    (SurveyField::DetailedDirections, "매우 상세함", 2),
    (SurveyField::DetailedDirections, "보통", 1),
    (SurveyField::FreeMarketingMessage, "가끔 활용", 1),
    (SurveyField::SeoOptimization, "잘 하고 있음", 2),
    (SurveyField::SeoOptimization, "보통", 1),
    (SurveyField::StatisticsAnalysis, "정기적으로 확인", 2),
    (SurveyField::StatisticsAnalysis, "가끔 확인", 1),
    (SurveyField::SearchableContent, "많이 있음", 2),
    (SurveyField::SearchableContent, "어느정도 있음", 1),
    (SurveyField::VideoCount, "10개 이상", 2),
    (SurveyField::VideoCount, "5-9개", 1),
    (SurveyField::Reviews, "많이 있음", 2),
    (SurveyField::Reviews, "어느정도 있음", 1),
    (SurveyField::LatestContent, "최근 3개월 내", 2),
    (SurveyField::LatestContent, "최근 6개월 내", 2),
    (SurveyField::DetailedInfo, "매우 상세함", 2),
    (SurveyField::DetailedInfo, "보통", 1),
    (SurveyField::AccurateInfo, "매우 정확함", 2),
    (SurveyField::AccurateInfo, "대부분 정확함", 1),
];

/// Keyword rules applied to answers that are not catalog labels.
struct KeywordGroup {
    strong: &'static [&'static str],
    moderate: &'static [&'static str],
}

const NAVER_PLACE_KEYWORDS: KeywordGroup = KeywordGroup {
    strong: &["매우", "활발", "잘", "정기적"],
    moderate: &["보통", "가끔"],
};
const INSTAGRAM_KEYWORDS: KeywordGroup = KeywordGroup {
    strong: &["많이", "10개 이상"],
    moderate: &["어느정도", "5-9개"],
};
const CONTENT_KEYWORDS: KeywordGroup = KeywordGroup {
    strong: &["매우", "최근"],
    moderate: &["보통", "대부분"],
};

impl KeywordGroup {
    fn for_field(field: SurveyField) -> Option<&'static KeywordGroup> {
        match field {
            SurveyField::AttractivePhotos
            | SurveyField::ReservationFeature
            | SurveyField::RegularNews
            | SurveyField::DetailedDirections
            | SurveyField::FreeMarketingMessage
            | SurveyField::SeoOptimization
            | SurveyField::ClipVideo
            | SurveyField::StatisticsAnalysis => Some(&NAVER_PLACE_KEYWORDS),
            SurveyField::SearchableContent | SurveyField::VideoCount | SurveyField::Reviews => {
                Some(&INSTAGRAM_KEYWORDS)
            }
            SurveyField::LatestContent | SurveyField::DetailedInfo | SurveyField::AccurateInfo => {
                Some(&CONTENT_KEYWORDS)
            }
            _ => None,
        }
    }

    fn classify(&self, answer: &str) -> u32 {
        if self.strong.iter().any(|keyword| answer.contains(keyword)) {
            STRONG_POINTS
        } else if self.moderate.iter().any(|keyword| answer.contains(keyword)) {
            MODERATE_POINTS
        } else {
            0
        }
    }
}

/// Points earned by one answer. Fields outside the scored set earn nothing.
pub fn answer_points(field: SurveyField, answer: &str) -> u32 {
    let Some(group) = KeywordGroup::for_field(field) else {
        return 0;
    };

    if catalog::question(field).offers(answer) {
        return SCORE_TABLE
            .iter()
            .find(|(entry_field, label, _)| *entry_field == field && *label == answer)
            .map(|(_, _, points)| *points)
            .unwrap_or(0);
    }

    group.classify(answer)
}

/// Marketing health percentage in `0..=100`.
pub fn marketing_score(record: &SurveyRecord) -> u8 {
    let earned: u32 = SurveyField::SCORED
        .iter()
        .map(|field| answer_points(*field, record.answer_or_empty(*field)))
        .sum();

    // round half up on the integer percentage
    let percent = (earned * 100 + MAX_POINTS / 2) / MAX_POINTS;
    percent.min(100) as u8
}

/// Coarse bucket used to colour scores in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBand {
    Healthy,
    Developing,
    Weak,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => ScoreBand::Healthy,
            40..=69 => ScoreBand::Developing,
            _ => ScoreBand::Weak,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Healthy => "양호",
            ScoreBand::Developing => "보통",
            ScoreBand::Weak => "개선 필요",
        }
    }
}
