use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Ordered wizard steps. The discriminant doubles as the step index.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SurveyStep {
    #[default]
    BasicInfo = 0,
    NaverPlace = 1,
    Instagram = 2,
    Blog = 3,
    Google = 4,
    PaidAds = 5,
    Complete = 6,
}

impl SurveyStep {
    pub const FIRST: SurveyStep = SurveyStep::BasicInfo;
    pub const LAST: SurveyStep = SurveyStep::Complete;

    pub fn ordered() -> [SurveyStep; 7] {
        [
            SurveyStep::BasicInfo,
            SurveyStep::NaverPlace,
            SurveyStep::Instagram,
            SurveyStep::Blog,
            SurveyStep::Google,
            SurveyStep::PaidAds,
            SurveyStep::Complete,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<SurveyStep> {
        Self::ordered().get(index).copied()
    }

    pub fn next(self) -> Option<SurveyStep> {
        Self::from_index(self.index() + 1)
    }

    pub fn previous(self) -> Option<SurveyStep> {
        self.index().checked_sub(1).and_then(Self::from_index)
    }

    pub fn label(self) -> &'static str {
        match self {
            SurveyStep::BasicInfo => "매장 기본정보",
            SurveyStep::NaverPlace => "네이버 플레이스 마케팅",
            SurveyStep::Instagram => "인스타그램 마케팅",
            SurveyStep::Blog => "블로그 마케팅",
            SurveyStep::Google => "구글 마케팅",
            SurveyStep::PaidAds => "유료 광고 현황",
            SurveyStep::Complete => "설문 완료",
        }
    }

    /// Fields that must be non-empty before the step can be left forward.
    pub fn required_fields(self) -> Vec<SurveyField> {
        SurveyField::ALL
            .iter()
            .copied()
            .filter(|field| field.step() == self && field.is_required())
            .collect()
    }
}

/// Every answer slot of a [`SurveyRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurveyField {
    StoreName,
    StoreType,
    BusinessArea,
    StoreSize,
    OwnerName,
    PhoneNumber,
    Email,
    AttractivePhotos,
    ReservationFeature,
    RegularNews,
    DetailedDirections,
    FreeMarketingMessage,
    SeoOptimization,
    ClipVideo,
    StatisticsAnalysis,
    SearchableContent,
    VideoCount,
    Reviews,
    LatestContent,
    DetailedInfo,
    AccurateInfo,
    NaverPlaceAds,
    NaverPlaceAdsBudget,
    NaverPowerlink,
    NaverPowerlinkBudget,
    InstagramReels,
    InstagramReelsBudget,
}

impl SurveyField {
    pub const ALL: [SurveyField; 27] = [
        SurveyField::StoreName,
        SurveyField::StoreType,
        SurveyField::BusinessArea,
        SurveyField::StoreSize,
        SurveyField::OwnerName,
        SurveyField::PhoneNumber,
        SurveyField::Email,
        SurveyField::AttractivePhotos,
        SurveyField::ReservationFeature,
        SurveyField::RegularNews,
        SurveyField::DetailedDirections,
        SurveyField::FreeMarketingMessage,
        SurveyField::SeoOptimization,
        SurveyField::ClipVideo,
        SurveyField::StatisticsAnalysis,
        SurveyField::SearchableContent,
        SurveyField::VideoCount,
        SurveyField::Reviews,
        SurveyField::LatestContent,
        SurveyField::DetailedInfo,
        SurveyField::AccurateInfo,
        SurveyField::NaverPlaceAds,
        SurveyField::NaverPlaceAdsBudget,
        SurveyField::NaverPowerlink,
        SurveyField::NaverPowerlinkBudget,
        SurveyField::InstagramReels,
        SurveyField::InstagramReelsBudget,
    ];

    /// The 14 answers that feed the marketing score, in report order.
    pub const SCORED: [SurveyField; 14] = [
        SurveyField::AttractivePhotos,
        SurveyField::ReservationFeature,
        SurveyField::RegularNews,
        SurveyField::DetailedDirections,
        SurveyField::FreeMarketingMessage,
        SurveyField::SeoOptimization,
        SurveyField::ClipVideo,
        SurveyField::StatisticsAnalysis,
        SurveyField::SearchableContent,
        SurveyField::VideoCount,
        SurveyField::Reviews,
        SurveyField::LatestContent,
        SurveyField::DetailedInfo,
        SurveyField::AccurateInfo,
    ];

    /// JSON path of the field as submitted by clients.
    pub fn key(self) -> &'static str {
        match self {
            SurveyField::StoreName => "storeName",
            SurveyField::StoreType => "storeType",
            SurveyField::BusinessArea => "businessArea",
            SurveyField::StoreSize => "storeSize",
            SurveyField::OwnerName => "ownerName",
            SurveyField::PhoneNumber => "phoneNumber",
            SurveyField::Email => "email",
            SurveyField::AttractivePhotos => "naverPlace.attractivePhotos",
            SurveyField::ReservationFeature => "naverPlace.reservationFeature",
            SurveyField::RegularNews => "naverPlace.regularNews",
            SurveyField::DetailedDirections => "naverPlace.detailedDirections",
            SurveyField::FreeMarketingMessage => "naverPlace.freeMarketingMessage",
            SurveyField::SeoOptimization => "naverPlace.seoOptimization",
            SurveyField::ClipVideo => "naverPlace.clipVideo",
            SurveyField::StatisticsAnalysis => "naverPlace.statisticsAnalysis",
            SurveyField::SearchableContent => "instagram.searchableContent",
            SurveyField::VideoCount => "instagram.videoCount",
            SurveyField::Reviews => "instagram.reviews",
            SurveyField::LatestContent => "blogMarketing.latestContent",
            SurveyField::DetailedInfo => "blogMarketing.detailedInfo",
            SurveyField::AccurateInfo => "google.accurateInfo",
            SurveyField::NaverPlaceAds => "paidAds.naverPlaceAds",
            SurveyField::NaverPlaceAdsBudget => "paidAds.naverPlaceAdsBudget",
            SurveyField::NaverPowerlink => "paidAds.naverPowerlink",
            SurveyField::NaverPowerlinkBudget => "paidAds.naverPowerlinkBudget",
            SurveyField::InstagramReels => "paidAds.instagramReels",
            SurveyField::InstagramReelsBudget => "paidAds.instagramReelsBudget",
        }
    }

    /// Short label used by the admin detail view and the CSV header.
    pub fn label(self) -> &'static str {
        match self {
            SurveyField::StoreName => "매장명",
            SurveyField::StoreType => "업종",
            SurveyField::BusinessArea => "상권",
            SurveyField::StoreSize => "매장규모",
            SurveyField::OwnerName => "사장님 성함",
            SurveyField::PhoneNumber => "연락처",
            SurveyField::Email => "이메일",
            SurveyField::AttractivePhotos => "사진 등재",
            SurveyField::ReservationFeature => "예약 기능",
            SurveyField::RegularNews => "매장 소식",
            SurveyField::DetailedDirections => "찾아오는 길",
            SurveyField::FreeMarketingMessage => "마케팅 메시지",
            SurveyField::SeoOptimization => "SEO 최적화",
            SurveyField::ClipVideo => "클립 영상",
            SurveyField::StatisticsAnalysis => "통계 분석",
            SurveyField::SearchableContent => "검색 노출",
            SurveyField::VideoCount => "영상 개수",
            SurveyField::Reviews => "고객 후기",
            SurveyField::LatestContent => "최신 콘텐츠",
            SurveyField::DetailedInfo => "상세 정보",
            SurveyField::AccurateInfo => "정보 정확성",
            SurveyField::NaverPlaceAds => "네이버 플레이스 광고",
            SurveyField::NaverPlaceAdsBudget => "네이버 플레이스 광고 예산",
            SurveyField::NaverPowerlink => "네이버 파워링크",
            SurveyField::NaverPowerlinkBudget => "네이버 파워링크 예산",
            SurveyField::InstagramReels => "인스타그램 릴스",
            SurveyField::InstagramReelsBudget => "인스타그램 릴스 예산",
        }
    }

    pub fn step(self) -> SurveyStep {
        match self {
            SurveyField::StoreName
            | SurveyField::StoreType
            | SurveyField::BusinessArea
            | SurveyField::StoreSize
            | SurveyField::OwnerName
            | SurveyField::PhoneNumber
            | SurveyField::Email => SurveyStep::BasicInfo,
            SurveyField::AttractivePhotos
            | SurveyField::ReservationFeature
            | SurveyField::RegularNews
            | SurveyField::DetailedDirections
            | SurveyField::FreeMarketingMessage
            | SurveyField::SeoOptimization
            | SurveyField::ClipVideo
            | SurveyField::StatisticsAnalysis => SurveyStep::NaverPlace,
            SurveyField::SearchableContent | SurveyField::VideoCount | SurveyField::Reviews => {
                SurveyStep::Instagram
            }
            SurveyField::LatestContent | SurveyField::DetailedInfo => SurveyStep::Blog,
            SurveyField::AccurateInfo => SurveyStep::Google,
            SurveyField::NaverPlaceAds
            | SurveyField::NaverPlaceAdsBudget
            | SurveyField::NaverPowerlink
            | SurveyField::NaverPowerlinkBudget
            | SurveyField::InstagramReels
            | SurveyField::InstagramReelsBudget => SurveyStep::PaidAds,
        }
    }

    /// Email and the paid-ads budgets are the only optional answers.
    pub fn is_required(self) -> bool {
        !matches!(self, SurveyField::Email) && self.budget_parent().is_none()
    }

    /// For a budget field, the primary answer that controls its visibility.
    pub fn budget_parent(self) -> Option<SurveyField> {
        match self {
            SurveyField::NaverPlaceAdsBudget => Some(SurveyField::NaverPlaceAds),
            SurveyField::NaverPowerlinkBudget => Some(SurveyField::NaverPowerlink),
            SurveyField::InstagramReelsBudget => Some(SurveyField::InstagramReels),
            _ => None,
        }
    }

    /// For a paid-ads primary answer, its conditional budget field.
    pub fn budget_child(self) -> Option<SurveyField> {
        match self {
            SurveyField::NaverPlaceAds => Some(SurveyField::NaverPlaceAdsBudget),
            SurveyField::NaverPowerlink => Some(SurveyField::NaverPowerlinkBudget),
            SurveyField::InstagramReels => Some(SurveyField::InstagramReelsBudget),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NaverPlaceAnswers {
    pub attractive_photos: String,
    pub reservation_feature: String,
    pub regular_news: String,
    pub detailed_directions: String,
    pub free_marketing_message: String,
    pub seo_optimization: String,
    pub clip_video: String,
    pub statistics_analysis: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstagramAnswers {
    pub searchable_content: String,
    pub video_count: String,
    pub reviews: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogMarketingAnswers {
    pub latest_content: String,
    pub detailed_info: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoogleAnswers {
    pub accurate_info: String,
}

/// Paid advertising answers. Budgets exist only while the primary answer
/// reports current or past spend; clients send `""` for an absent budget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaidAdsAnswers {
    pub naver_place_ads: String,
    #[serde(
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub naver_place_ads_budget: Option<String>,
    pub naver_powerlink: String,
    #[serde(
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub naver_powerlink_budget: Option<String>,
    pub instagram_reels: String,
    #[serde(
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub instagram_reels_budget: Option<String>,
}

/// One respondent's complete answers.
///
/// Deserialization is lenient: missing fields default to empty and values are
/// kept verbatim, whether or not they belong to the option catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurveyRecord {
    pub store_name: String,
    pub store_type: String,
    pub business_area: String,
    pub store_size: String,
    pub owner_name: String,
    pub phone_number: String,
    #[serde(
        deserialize_with = "empty_string_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub email: Option<String>,
    pub naver_place: NaverPlaceAnswers,
    pub instagram: InstagramAnswers,
    pub blog_marketing: BlogMarketingAnswers,
    pub google: GoogleAnswers,
    pub paid_ads: PaidAdsAnswers,
}

enum AnswerSlot<'a> {
    Required(&'a mut String),
    Optional(&'a mut Option<String>),
}

impl SurveyRecord {
    /// Current value of a field. Absent optional answers read as `None`.
    pub fn answer(&self, field: SurveyField) -> Option<&str> {
        let value = match field {
            SurveyField::StoreName => &self.store_name,
            SurveyField::StoreType => &self.store_type,
            SurveyField::BusinessArea => &self.business_area,
            SurveyField::StoreSize => &self.store_size,
            SurveyField::OwnerName => &self.owner_name,
            SurveyField::PhoneNumber => &self.phone_number,
            SurveyField::Email => return self.email.as_deref(),
            SurveyField::AttractivePhotos => &self.naver_place.attractive_photos,
            SurveyField::ReservationFeature => &self.naver_place.reservation_feature,
            SurveyField::RegularNews => &self.naver_place.regular_news,
            SurveyField::DetailedDirections => &self.naver_place.detailed_directions,
            SurveyField::FreeMarketingMessage => &self.naver_place.free_marketing_message,
            SurveyField::SeoOptimization => &self.naver_place.seo_optimization,
            SurveyField::ClipVideo => &self.naver_place.clip_video,
            SurveyField::StatisticsAnalysis => &self.naver_place.statistics_analysis,
            SurveyField::SearchableContent => &self.instagram.searchable_content,
            SurveyField::VideoCount => &self.instagram.video_count,
            SurveyField::Reviews => &self.instagram.reviews,
            SurveyField::LatestContent => &self.blog_marketing.latest_content,
            SurveyField::DetailedInfo => &self.blog_marketing.detailed_info,
            SurveyField::AccurateInfo => &self.google.accurate_info,
            SurveyField::NaverPlaceAds => &self.paid_ads.naver_place_ads,
            SurveyField::NaverPlaceAdsBudget => {
                return self.paid_ads.naver_place_ads_budget.as_deref()
            }
            SurveyField::NaverPowerlink => &self.paid_ads.naver_powerlink,
            SurveyField::NaverPowerlinkBudget => {
                return self.paid_ads.naver_powerlink_budget.as_deref()
            }
            SurveyField::InstagramReels => &self.paid_ads.instagram_reels,
            SurveyField::InstagramReelsBudget => {
                return self.paid_ads.instagram_reels_budget.as_deref()
            }
        };
        Some(value.as_str())
    }

    /// Value of a field with absent answers read as `""`.
    pub fn answer_or_empty(&self, field: SurveyField) -> &str {
        self.answer(field).unwrap_or_default()
    }

    pub fn is_answered(&self, field: SurveyField) -> bool {
        !self.answer_or_empty(field).is_empty()
    }

    /// Overwrite a single field. An empty value clears optional answers.
    pub fn set_answer(&mut self, field: SurveyField, value: impl Into<String>) {
        let value = value.into();
        match self.slot_mut(field) {
            AnswerSlot::Required(slot) => *slot = value,
            AnswerSlot::Optional(slot) => {
                *slot = if value.is_empty() { None } else { Some(value) };
            }
        }
    }

    fn slot_mut(&mut self, field: SurveyField) -> AnswerSlot<'_> {
        use AnswerSlot::{Optional, Required};
        match field {
            SurveyField::StoreName => Required(&mut self.store_name),
            SurveyField::StoreType => Required(&mut self.store_type),
            SurveyField::BusinessArea => Required(&mut self.business_area),
            SurveyField::StoreSize => Required(&mut self.store_size),
            SurveyField::OwnerName => Required(&mut self.owner_name),
            SurveyField::PhoneNumber => Required(&mut self.phone_number),
            SurveyField::Email => Optional(&mut self.email),
            SurveyField::AttractivePhotos => Required(&mut self.naver_place.attractive_photos),
            SurveyField::ReservationFeature => Required(&mut self.naver_place.reservation_feature),
            SurveyField::RegularNews => Required(&mut self.naver_place.regular_news),
            SurveyField::DetailedDirections => Required(&mut self.naver_place.detailed_directions),
            SurveyField::FreeMarketingMessage => {
                Required(&mut self.naver_place.free_marketing_message)
            }
            SurveyField::SeoOptimization => Required(&mut self.naver_place.seo_optimization),
            SurveyField::ClipVideo => Required(&mut self.naver_place.clip_video),
            SurveyField::StatisticsAnalysis => Required(&mut self.naver_place.statistics_analysis),
            SurveyField::SearchableContent => Required(&mut self.instagram.searchable_content),
            SurveyField::VideoCount => Required(&mut self.instagram.video_count),
            SurveyField::Reviews => Required(&mut self.instagram.reviews),
            SurveyField::LatestContent => Required(&mut self.blog_marketing.latest_content),
            SurveyField::DetailedInfo => Required(&mut self.blog_marketing.detailed_info),
            SurveyField::AccurateInfo => Required(&mut self.google.accurate_info),
            SurveyField::NaverPlaceAds => Required(&mut self.paid_ads.naver_place_ads),
            SurveyField::NaverPlaceAdsBudget => Optional(&mut self.paid_ads.naver_place_ads_budget),
            SurveyField::NaverPowerlink => Required(&mut self.paid_ads.naver_powerlink),
            SurveyField::NaverPowerlinkBudget => {
                Optional(&mut self.paid_ads.naver_powerlink_budget)
            }
            SurveyField::InstagramReels => Required(&mut self.paid_ads.instagram_reels),
            SurveyField::InstagramReelsBudget => {
                Optional(&mut self.paid_ads.instagram_reels_budget)
            }
        }
    }
}

/// A persisted record as seen by the admin view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResult {
    pub id: String,
    pub submitted_at: DateTime<Utc>,
    #[serde(flatten)]
    pub record: SurveyRecord,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_client_payload_with_empty_budgets() {
        let payload = json!({
            "storeName": "Cafe A",
            "email": "",
            "paidAds": {
                "naverPlaceAds": "해본 적 없음",
                "naverPlaceAdsBudget": "",
                "naverPowerlink": "현재 진행중",
                "naverPowerlinkBudget": "10-30만원"
            }
        });

        let record: SurveyRecord = serde_json::from_value(payload).expect("payload parses");
        assert_eq!(record.store_name, "Cafe A");
        assert_eq!(record.email, None);
        assert_eq!(record.paid_ads.naver_place_ads_budget, None);
        assert_eq!(
            record.paid_ads.naver_powerlink_budget.as_deref(),
            Some("10-30만원")
        );
        assert!(record.naver_place.attractive_photos.is_empty());
    }

    #[test]
    fn set_answer_leaves_siblings_untouched() {
        let mut record = SurveyRecord::default();
        record.set_answer(SurveyField::ClipVideo, "없음");
        record.set_answer(SurveyField::RegularNews, "주 1-2회");
        record.set_answer(SurveyField::ClipVideo, "여러 개 있음");

        assert_eq!(record.naver_place.clip_video, "여러 개 있음");
        assert_eq!(record.naver_place.regular_news, "주 1-2회");
        assert!(record.naver_place.attractive_photos.is_empty());
    }

    #[test]
    fn empty_value_clears_optional_answers() {
        let mut record = SurveyRecord::default();
        record.set_answer(SurveyField::Email, "owner@example.com");
        assert_eq!(record.answer(SurveyField::Email), Some("owner@example.com"));

        record.set_answer(SurveyField::Email, "");
        assert_eq!(record.answer(SurveyField::Email), None);
        assert_eq!(record.answer_or_empty(SurveyField::Email), "");
    }

    #[test]
    fn required_fields_follow_step_layout() {
        assert_eq!(SurveyStep::BasicInfo.required_fields().len(), 6);
        assert_eq!(SurveyStep::NaverPlace.required_fields().len(), 8);
        assert_eq!(SurveyStep::Instagram.required_fields().len(), 3);
        assert_eq!(SurveyStep::Blog.required_fields().len(), 2);
        assert_eq!(SurveyStep::Google.required_fields().len(), 1);
        assert_eq!(
            SurveyStep::PaidAds.required_fields(),
            vec![
                SurveyField::NaverPlaceAds,
                SurveyField::NaverPowerlink,
                SurveyField::InstagramReels
            ]
        );
        assert!(SurveyStep::Complete.required_fields().is_empty());
    }

    #[test]
    fn result_flattens_record_fields() {
        let mut record = SurveyRecord::default();
        record.store_name = "Store B".to_string();
        let result = SurveyResult {
            id: "survey_Store B_2025-01-02T03-04-05-006Z".to_string(),
            submitted_at: DateTime::parse_from_rfc3339("2025-01-02T03:04:05.006Z")
                .expect("valid timestamp")
                .with_timezone(&Utc),
            record,
        };

        let value = serde_json::to_value(&result).expect("serializes");
        assert_eq!(value["storeName"], "Store B");
        assert_eq!(value["submittedAt"], "2025-01-02T03:04:05.006Z");
        assert!(value.get("record").is_none());
    }
}
