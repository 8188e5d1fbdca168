//! Question prompts and the fixed option sets offered by the wizard.

use super::domain::{SurveyField, SurveyRecord};

/// Paid-ads answers that make the matching budget question relevant.
pub const ACTIVE_SPEND_ANSWERS: [&str; 2] = ["현재 진행중", "과거에 했음"];

/// Fallback label for an email the respondent did not provide.
pub const MISSING_EMAIL_LABEL: &str = "미입력";

const STORE_TYPES: &[&str] = &[
    "한식당",
    "중식당",
    "일식당",
    "양식당",
    "카페",
    "베이커리",
    "치킨전문점",
    "피자전문점",
    "분식점",
    "기타",
];
const BUSINESS_AREAS: &[&str] = &["주택가", "오피스가", "대학가", "관광지", "상업지구", "기타"];
const STORE_SIZES: &[&str] = &["10평 미만", "10-20평", "20-30평", "30-50평", "50평 이상"];

const PAID_AD_STATUS: &[&str] = &["현재 진행중", "과거에 했음", "해본 적 없음", "모르겠음"];
const MONTHLY_BUDGETS: &[&str] = &[
    "10만원 미만",
    "10-30만원",
    "30-50만원",
    "50-100만원",
    "100만원 이상",
    "기억 안남",
];

/// A question of the survey with its prompt and, for choice questions, the
/// labels the wizard offers.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub field: SurveyField,
    pub prompt: &'static str,
    pub options: &'static [&'static str],
}

impl Question {
    pub fn is_free_text(&self) -> bool {
        self.options.is_empty()
    }

    pub fn offers(&self, label: &str) -> bool {
        self.options.contains(&label)
    }
}

pub fn question(field: SurveyField) -> Question {
    let (prompt, options): (&'static str, &'static [&'static str]) = match field {
        SurveyField::StoreName => ("매장명", &[]),
        SurveyField::StoreType => ("업종", STORE_TYPES),
        SurveyField::BusinessArea => ("상권 유형", BUSINESS_AREAS),
        SurveyField::StoreSize => ("매장 규모", STORE_SIZES),
        SurveyField::OwnerName => ("사장님 성함", &[]),
        SurveyField::PhoneNumber => ("연락처", &[]),
        SurveyField::Email => ("이메일", &[]),
        SurveyField::AttractivePhotos => (
            "사진이 매력적으로 등재되어 있나요?",
            &["매우 잘 되어있음", "보통", "부족함", "전혀 안됨", "모르겠음"],
        ),
        SurveyField::ReservationFeature => (
            "예약 기능을 활용하고 있나요?",
            &["활발히 사용", "가끔 사용", "설정만 해둠", "사용 안함", "모르겠음"],
        ),
        SurveyField::RegularNews => (
            "매장 소식을 주기적으로 올리고 있나요?",
            &["주 3회 이상", "주 1-2회", "월 1-2회", "거의 안함", "모르겠음"],
        ),
        SurveyField::DetailedDirections => (
            "찾아오는 길이 상세하게 설명되어 있나요?",
            &["매우 상세함", "보통", "부족함", "전혀 없음", "모르겠음"],
        ),
        SurveyField::FreeMarketingMessage => (
            "무료 마케팅 메시지로 재방문을 유치하고 있나요?",
            &["적극 활용", "가끔 활용", "설정만 해둠", "사용 안함", "모르겠음"],
        ),
        SurveyField::SeoOptimization => (
            "대표키워드로 SEO 최적화를 하고 있나요?",
            &["잘 하고 있음", "보통", "부족함", "전혀 안함", "모르겠음"],
        ),
        SurveyField::ClipVideo => (
            "클립 영상으로 매장을 소개하고 있나요?",
            &["여러 개 있음", "1-2개 있음", "만들 예정", "없음", "모르겠음"],
        ),
        SurveyField::StatisticsAnalysis => (
            "통계를 확인하여 유입 고객을 분석하고 있나요?",
            &["정기적으로 확인", "가끔 확인", "확인 방법 모름", "관심 없음", "모르겠음"],
        ),
        SurveyField::SearchableContent => (
            "인스타그램에서 매장을 검색하면 노출되는 콘텐츠가 있나요?",
            &["많이 있음", "어느정도 있음", "조금 있음", "거의 없음", "모르겠음"],
        ),
        SurveyField::VideoCount => (
            "매장 관련 영상이 몇 개 정도 등재되어 있나요?",
            &["10개 이상", "5-9개", "1-4개", "없음", "모르겠음"],
        ),
        SurveyField::Reviews => (
            "고객 후기들이 인스타그램에 있나요?",
            &["많이 있음", "어느정도 있음", "조금 있음", "거의 없음", "모르겠음"],
        ),
        SurveyField::LatestContent => (
            "매장명을 검색했을 때 블로그 콘텐츠가 최신 상태인가요?",
            &["최근 3개월 내", "최근 6개월 내", "1년 이상 된 것", "거의 없음", "모르겠음"],
        ),
        SurveyField::DetailedInfo => (
            "플레이스에서 보여줄 수 없는 상세 정보가 블로그에 잘 나와있나요?",
            &["매우 상세함", "보통", "부족함", "거의 없음", "모르겠음"],
        ),
        SurveyField::AccurateInfo => (
            "구글에 매장 정보가 정확하게 등재되어 있나요?",
            &[
                "매우 정확함",
                "대부분 정확함",
                "일부 틀림",
                "많이 틀림",
                "등재 안됨",
                "모르겠음",
            ],
        ),
        SurveyField::NaverPlaceAds => (
            "네이버 플레이스 상위노출 광고를 진행한 적이 있나요?",
            PAID_AD_STATUS,
        ),
        SurveyField::NaverPowerlink => ("네이버 파워링크를 진행한 적이 있나요?", PAID_AD_STATUS),
        SurveyField::InstagramReels => (
            "인스타그램 릴스 스폰서 광고를 진행하고 있나요?",
            PAID_AD_STATUS,
        ),
        SurveyField::NaverPlaceAdsBudget => ("네이버 플레이스 광고 월 예산", MONTHLY_BUDGETS),
        SurveyField::NaverPowerlinkBudget => ("네이버 파워링크 월 예산", MONTHLY_BUDGETS),
        SurveyField::InstagramReelsBudget => ("인스타그램 릴스 광고 월 예산", MONTHLY_BUDGETS),
    };

    Question {
        field,
        prompt,
        options,
    }
}

/// Whether a paid-ads primary answer makes its budget question relevant.
pub fn implies_spend(answer: &str) -> bool {
    ACTIVE_SPEND_ANSWERS.contains(&answer)
}

/// Whether the budget `field` should be shown for the given record.
pub fn budget_visible(record: &SurveyRecord, field: SurveyField) -> bool {
    field
        .budget_parent()
        .is_some_and(|parent| implies_spend(record.answer_or_empty(parent)))
}

/// Choice answers whose value is not one of the offered labels.
///
/// Empty answers and free-text questions are never reported.
pub fn off_catalog_answers(record: &SurveyRecord) -> Vec<SurveyField> {
    SurveyField::ALL
        .iter()
        .copied()
        .filter(|field| {
            let question = question(*field);
            let answer = record.answer_or_empty(*field);
            !question.is_free_text() && !answer.is_empty() && !question.offers(answer)
        })
        .collect()
}
