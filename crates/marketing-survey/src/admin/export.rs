use chrono::NaiveDate;
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::survey::domain::{SurveyField, SurveyResult};
use crate::survey::report::seoul_time;
use crate::survey::scoring::marketing_score;

const UTF8_BOM: &str = "\u{feff}";

/// Column order of the results spreadsheet.
pub const CSV_HEADERS: [&str; 29] = [
    "제출일시",
    "매장명",
    "업종",
    "상권",
    "매장규모",
    "사장님 성함",
    "연락처",
    "이메일",
    "마케팅 점수",
    "사진 등재",
    "예약 기능",
    "매장 소식",
    "찾아오는 길",
    "마케팅 메시지",
    "SEO 최적화",
    "클립 영상",
    "통계 분석",
    "검색 노출",
    "영상 개수",
    "고객 후기",
    "최신 콘텐츠",
    "상세 정보",
    "정보 정확성",
    "네이버 플레이스 광고",
    "네이버 플레이스 광고 예산",
    "네이버 파워링크",
    "네이버 파워링크 예산",
    "인스타그램 릴스",
    "인스타그램 릴스 예산",
];

const CONTACT_FIELDS: [SurveyField; 7] = [
    SurveyField::StoreName,
    SurveyField::StoreType,
    SurveyField::BusinessArea,
    SurveyField::StoreSize,
    SurveyField::OwnerName,
    SurveyField::PhoneNumber,
    SurveyField::Email,
];

const PAID_AD_FIELDS: [SurveyField; 6] = [
    SurveyField::NaverPlaceAds,
    SurveyField::NaverPlaceAdsBudget,
    SurveyField::NaverPowerlink,
    SurveyField::NaverPowerlinkBudget,
    SurveyField::InstagramReels,
    SurveyField::InstagramReelsBudget,
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// A rendered export ready to be written or served as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub file_name: String,
    pub body: String,
    rows: usize,
}

impl CsvExport {
    pub fn build<'a, I>(results: I, today: NaiveDate) -> Result<Self, ExportError>
    where
        I: IntoIterator<Item = &'a SurveyResult>,
    {
        let (body, rows) = write_csv(results)?;
        Ok(Self {
            file_name: export_file_name(today),
            body,
            rows,
        })
    }

    /// Number of survey records in the body, not counting the header.
    pub fn row_count(&self) -> usize {
        self.rows
    }
}

pub fn export_file_name(today: NaiveDate) -> String {
    format!("survey_results_{}.csv", today.format("%Y-%m-%d"))
}

fn row(result: &SurveyResult) -> Vec<String> {
    let record = &result.record;
    let mut row = Vec::with_capacity(CSV_HEADERS.len());
    row.push(
        seoul_time(result.submitted_at)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    );
    row.extend(
        CONTACT_FIELDS
            .iter()
            .map(|field| record.answer_or_empty(*field).to_string()),
    );
    row.push(marketing_score(record).to_string());
    row.extend(
        SurveyField::SCORED
            .iter()
            .chain(PAID_AD_FIELDS.iter())
            .map(|field| record.answer_or_empty(*field).to_string()),
    );
    row
}

/// Spreadsheet-friendly CSV: BOM-prefixed UTF-8, every field quoted, CRLF
/// line endings.
pub fn export_csv<'a, I>(results: I) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a SurveyResult>,
{
    write_csv(results).map(|(body, _)| body)
}

fn write_csv<'a, I>(results: I) -> Result<(String, usize), ExportError>
where
    I: IntoIterator<Item = &'a SurveyResult>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(UTF8_BOM.as_bytes().to_vec());

    writer.write_record(CSV_HEADERS)?;
    let mut rows = 0;
    for result in results {
        writer.write_record(row(result))?;
        rows += 1;
    }

    let bytes = writer.into_inner().map_err(|err| err.into_error())?;
    Ok((String::from_utf8(bytes)?, rows))
}
