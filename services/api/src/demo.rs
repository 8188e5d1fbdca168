use crate::admin::{listing_line, render_stats};
use crate::infra::{ConfiguredMailer, InMemorySurveyStore};
use chrono::Utc;
use clap::Args;
use marketing_survey::admin::{AdminDashboard, AdminGate, ExportScope};
use marketing_survey::error::AppError;
use marketing_survey::survey::report::seoul_time;
use marketing_survey::survey::{
    marketing_score, IntakeSettings, ScoreBand, SurveyField, SurveyIntakeService, SurveyStep,
    SurveyWizard, TracingMailer,
};
use std::sync::Arc;

const DEMO_PASSWORD: &str = "demo";

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Store name used for the walkthrough respondent
    #[arg(long, default_value = "성수동 브런치카페")]
    pub(crate) store_name: String,
    /// Number of CSV lines to preview after the export
    #[arg(long, default_value_t = 3)]
    pub(crate) csv_preview_lines: usize,
    /// Skip the admin dashboard portion of the demo
    #[arg(long)]
    pub(crate) skip_admin: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            store_name: "성수동 브런치카페".to_string(),
            csv_preview_lines: 3,
            skip_admin: false,
        }
    }
}

type DemoService = SurveyIntakeService<InMemorySurveyStore, ConfiguredMailer>;

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        store_name,
        csv_preview_lines,
        skip_admin,
    } = args;

    let store = Arc::new(InMemorySurveyStore::default());
    let service = SurveyIntakeService::new(
        store.clone(),
        Arc::new(ConfiguredMailer::Log(TracingMailer)),
        IntakeSettings {
            persist: true,
            sender: Some("survey-demo@example.com".to_string()),
            recipients: vec!["consulting@example.com".to_string()],
        },
    );

    println!("Marketing survey demo");
    let answers = walkthrough_answers(&store_name);
    let wizard = walk_survey(&service, &answers)?;
    let score = marketing_score(wizard.record());
    println!(
        "\n{} scored {}% ({})",
        store_name,
        score,
        ScoreBand::from_score(score).label()
    );

    for (name, answers) in background_respondents() {
        walk_survey(&service, &answers)?;
        println!("- background respondent {name} submitted");
    }

    if skip_admin {
        return Ok(());
    }

    let dashboard = AdminDashboard::new(store, AdminGate::new(DEMO_PASSWORD));
    dashboard.login(DEMO_PASSWORD)?;
    println!("\nAdmin dashboard");
    for result in dashboard.results() {
        println!("  {}", listing_line(&result));
    }
    println!("  {}", render_stats(&dashboard.stats()));

    if let Some(first) = dashboard.results().first() {
        dashboard.select(&first.id)?;
        println!("\nDetail: {}", first.id);
        for (label, value) in dashboard.selected_detail().unwrap_or_default() {
            println!("  {label}: {value}");
        }
        dashboard.clear_selection();
    }

    dashboard.set_search("카페");
    println!(
        "\nSearch '카페' matches {} of {}",
        dashboard.filtered().len(),
        dashboard.results().len()
    );

    let export = dashboard.export_csv(ExportScope::Filtered, seoul_time(Utc::now()).date())?;
    println!(
        "\nCSV export {} ({} rows)",
        export.file_name,
        export.row_count()
    );
    for line in export.body.lines().take(csv_preview_lines) {
        println!("  {}", line.trim_start_matches('\u{feff}'));
    }

    dashboard.logout();
    Ok(())
}

fn walk_survey(
    service: &DemoService,
    answers: &[(SurveyField, &str)],
) -> Result<SurveyWizard, AppError> {
    let mut wizard = SurveyWizard::new();
    loop {
        let step = wizard.step();
        for (field, answer) in answers.iter().filter(|(field, _)| field.step() == step) {
            wizard.set(*field, *answer)?;
        }

        if step == SurveyStep::PaidAds {
            let receipt = wizard.submit(service).map_err(|err| {
                if let Some(prompt) = err.user_message() {
                    println!("  {} -> {prompt}", step.label());
                }
                err
            })?;
            println!("  {} -> {}", step.label(), receipt.message);
            return Ok(wizard);
        }

        let (current, total) = wizard.position();
        println!(
            "  [{current}/{total}] {} complete ({}%)",
            step.label(),
            wizard.progress_percent()
        );
        wizard.next()?;
    }
}

fn walkthrough_answers(store_name: &str) -> Vec<(SurveyField, &str)> {
    vec![
        (SurveyField::StoreName, store_name),
        (SurveyField::StoreType, "카페"),
        (SurveyField::BusinessArea, "상업지구"),
        (SurveyField::StoreSize, "20-30평"),
        (SurveyField::OwnerName, "김민지"),
        (SurveyField::PhoneNumber, "010-1234-5678"),
        (SurveyField::Email, "owner@example.com"),
        (SurveyField::AttractivePhotos, "보통"),
        (SurveyField::ReservationFeature, "가끔 사용"),
        (SurveyField::RegularNews, "월 1-2회"),
        (SurveyField::DetailedDirections, "매우 상세함"),
        (SurveyField::FreeMarketingMessage, "설정만 해둠"),
        (SurveyField::SeoOptimization, "부족함"),
        (SurveyField::ClipVideo, "만들 예정"),
        (SurveyField::StatisticsAnalysis, "가끔 확인"),
        (SurveyField::SearchableContent, "어느정도 있음"),
        (SurveyField::VideoCount, "1-4개"),
        (SurveyField::Reviews, "많이 있음"),
        (SurveyField::LatestContent, "최근 6개월 내"),
        (SurveyField::DetailedInfo, "보통"),
        (SurveyField::AccurateInfo, "대부분 정확함"),
        (SurveyField::NaverPlaceAds, "과거에 했음"),
        (SurveyField::NaverPlaceAdsBudget, "10-30만원"),
        (SurveyField::NaverPowerlink, "해본 적 없음"),
        (SurveyField::InstagramReels, "모르겠음"),
    ]
}

fn background_respondents() -> Vec<(&'static str, Vec<(SurveyField, &'static str)>)> {
    let shared = |store: &'static str, store_type: &'static str, level: &'static str| {
        vec![
            (SurveyField::StoreName, store),
            (SurveyField::StoreType, store_type),
            (SurveyField::BusinessArea, "주택가"),
            (SurveyField::StoreSize, "10-20평"),
            (SurveyField::OwnerName, "이대표"),
            (SurveyField::PhoneNumber, "010-5555-0000"),
            (SurveyField::AttractivePhotos, level),
            (SurveyField::ReservationFeature, "사용 안함"),
            (SurveyField::RegularNews, "거의 안함"),
            (SurveyField::DetailedDirections, level),
            (SurveyField::FreeMarketingMessage, "사용 안함"),
            (SurveyField::SeoOptimization, level),
            (SurveyField::ClipVideo, "없음"),
            (SurveyField::StatisticsAnalysis, "관심 없음"),
            (SurveyField::SearchableContent, "조금 있음"),
            (SurveyField::VideoCount, "없음"),
            (SurveyField::Reviews, "조금 있음"),
            (SurveyField::LatestContent, "거의 없음"),
            (SurveyField::DetailedInfo, level),
            (SurveyField::AccurateInfo, "등재 안됨"),
            (SurveyField::NaverPlaceAds, "해본 적 없음"),
            (SurveyField::NaverPowerlink, "현재 진행중"),
            (SurveyField::NaverPowerlinkBudget, "30-50만원"),
            (SurveyField::InstagramReels, "해본 적 없음"),
        ]
    };
    vec![
        ("골목 분식", shared("골목 분식", "분식점", "보통")),
        ("동네 베이커리", shared("동네 베이커리", "베이커리", "부족함")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketing_survey::survey::SurveyStore;

    #[test]
    fn demo_runs_end_to_end() {
        run_demo(DemoArgs::default()).expect("demo completes");
    }

    #[test]
    fn walkthrough_submits_into_the_memory_store() {
        let store = Arc::new(InMemorySurveyStore::default());
        let service = SurveyIntakeService::new(
            store.clone(),
            Arc::new(ConfiguredMailer::Log(TracingMailer)),
            IntakeSettings {
                persist: true,
                sender: None,
                recipients: Vec::new(),
            },
        );

        let wizard = walk_survey(&service, &walkthrough_answers("Demo Cafe")).expect("walk completes");

        assert_eq!(wizard.step(), SurveyStep::Complete);
        let stored = store.list().expect("list succeeds");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].record.store_name, "Demo Cafe");
        assert_eq!(
            stored[0].record.paid_ads.naver_place_ads_budget.as_deref(),
            Some("10-30만원")
        );
    }
}
