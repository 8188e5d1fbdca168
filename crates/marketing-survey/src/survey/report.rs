//! Human-readable renderings of a survey: the HTML report mailed to the
//! consulting team and the label/value rows of the admin detail view.

use std::fmt::Write as _;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use super::catalog::{self, MISSING_EMAIL_LABEL};
use super::domain::{SurveyField, SurveyRecord, SurveyStep};
use super::scoring::marketing_score;

const SEOUL_UTC_OFFSET_HOURS: i64 = 9;

/// A titled group of answers as laid out in the report.
#[derive(Debug, Clone, Copy)]
pub struct ReportSection {
    pub title: &'static str,
    pub fields: &'static [SurveyField],
}

pub const REPORT_SECTIONS: [ReportSection; 6] = [
    ReportSection {
        title: "📍 매장 기본정보",
        fields: &[
            SurveyField::StoreName,
            SurveyField::StoreType,
            SurveyField::BusinessArea,
            SurveyField::StoreSize,
            SurveyField::OwnerName,
            SurveyField::PhoneNumber,
            SurveyField::Email,
        ],
    },
    ReportSection {
        title: "🔍 네이버 플레이스 마케팅 현황",
        fields: &[
            SurveyField::AttractivePhotos,
            SurveyField::ReservationFeature,
            SurveyField::RegularNews,
            SurveyField::DetailedDirections,
            SurveyField::FreeMarketingMessage,
            SurveyField::SeoOptimization,
            SurveyField::ClipVideo,
            SurveyField::StatisticsAnalysis,
        ],
    },
    ReportSection {
        title: "📱 인스타그램 마케팅 현황",
        fields: &[
            SurveyField::SearchableContent,
            SurveyField::VideoCount,
            SurveyField::Reviews,
        ],
    },
    ReportSection {
        title: "📝 체험단/블로그 마케팅 현황",
        fields: &[SurveyField::LatestContent, SurveyField::DetailedInfo],
    },
    ReportSection {
        title: "🌐 구글 마케팅 현황",
        fields: &[SurveyField::AccurateInfo],
    },
    ReportSection {
        title: "💰 유료 광고 현황",
        fields: &[
            SurveyField::NaverPlaceAds,
            SurveyField::NaverPlaceAdsBudget,
            SurveyField::NaverPowerlink,
            SurveyField::NaverPowerlinkBudget,
            SurveyField::InstagramReels,
            SurveyField::InstagramReelsBudget,
        ],
    },
];

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto; padding: 20px; }
.header { background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin-bottom: 30px; text-align: center; }
.section { margin-bottom: 30px; }
.section-title { background-color: #e9ecef; padding: 15px; border-radius: 5px; font-weight: bold; font-size: 18px; margin-bottom: 15px; }
.question { margin-bottom: 10px; }
.question-title { font-weight: bold; color: #495057; margin-bottom: 5px; }
.answer { background-color: #f8f9fa; padding: 8px 12px; border-radius: 4px; margin-left: 20px; }
.follow-up { margin-top: 40px; padding: 20px; background-color: #fff3cd; border: 1px solid #ffeaa7; border-radius: 5px; }";

/// Wall-clock time in Asia/Seoul, which has no daylight saving.
pub fn seoul_time(at: DateTime<Utc>) -> NaiveDateTime {
    at.naive_utc() + Duration::hours(SEOUL_UTC_OFFSET_HOURS)
}

pub fn subject(record: &SurveyRecord) -> String {
    format!(
        "[신규 설문] {} - 마케팅 컨설팅 설문조사 결과",
        record.store_name
    )
}

pub fn html_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Value shown for a field, or `None` when the row is omitted.
///
/// Budgets only appear when answered; a missing email reads `미입력`.
fn display_value(record: &SurveyRecord, field: SurveyField) -> Option<&str> {
    match field {
        SurveyField::Email => Some(record.answer(field).unwrap_or(MISSING_EMAIL_LABEL)),
        _ if field.budget_parent().is_some() => record.answer(field),
        _ => Some(record.answer_or_empty(field)),
    }
}

// Basic info and budget prompts are bare nouns and read as "label:".
fn html_prompt(field: SurveyField) -> String {
    let prompt = catalog::question(field).prompt;
    if field.step() == SurveyStep::BasicInfo || field.budget_parent().is_some() {
        format!("{prompt}:")
    } else {
        prompt.to_string()
    }
}

/// HTML mail body for a submitted record.
pub fn render_html(record: &SurveyRecord, submitted_at: DateTime<Utc>) -> String {
    let submitted = seoul_time(submitted_at).format("%Y-%m-%d %H:%M");
    let mut html = String::new();

    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>마케팅 컨설팅 설문조사 결과</title>\n<style>\n{STYLE}\n</style>\n</head>\n<body>\n"
    );
    let _ = write!(
        html,
        "<div class=\"header\">\n<h1>🍽️ 음식점/카페 마케팅 컨설팅 설문조사 결과</h1>\n<p><strong>제출일시:</strong> {submitted} (KST)</p>\n<p><strong>마케팅 점수:</strong> {}%</p>\n</div>\n",
        marketing_score(record)
    );

    for section in REPORT_SECTIONS {
        let _ = write!(
            html,
            "<div class=\"section\">\n<div class=\"section-title\">{}</div>\n",
            section.title
        );
        for field in section.fields {
            let Some(value) = display_value(record, *field) else {
                continue;
            };
            let _ = write!(
                html,
                "<div class=\"question\">\n<div class=\"question-title\">{}</div>\n<div class=\"answer\">{}</div>\n</div>\n",
                html_prompt(*field),
                html_escape(value)
            );
        }
        html.push_str("</div>\n");
    }

    let _ = write!(
        html,
        "<div class=\"follow-up\">\n<h3>📋 컨설팅 대응 필요 사항</h3>\n<p>위 설문 결과를 바탕으로 맞춤형 마케팅 컨설팅을 진행해주세요.</p>\n<p><strong>연락처:</strong> {}</p>\n",
        html_escape(&record.phone_number)
    );
    if let Some(email) = record.email.as_deref() {
        let _ = writeln!(html, "<p><strong>이메일:</strong> {}</p>", html_escape(email));
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// `(label, value)` rows of the admin detail view, in report order.
pub fn detail_rows(record: &SurveyRecord) -> Vec<(&'static str, String)> {
    REPORT_SECTIONS
        .iter()
        .flat_map(|section| section.fields.iter().copied())
        .filter_map(|field| {
            display_value(record, field).map(|value| (field.label(), value.to_string()))
        })
        .collect()
}
