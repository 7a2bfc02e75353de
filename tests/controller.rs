mod common;

use common::{Recording, Scripted, bare_body, full_body};
use sequia::chart::ChartKind;
use sequia::controller::Ticket;
use sequia::{
    AnalysisController, AnalysisError, Catalog, DroughtCategory, ElementId, LanguageSwitcher,
    Locale, MemoryStore, Outcome, Page, RegressionError, SubmissionPolicy,
};
use serde_json::json;

fn displayed(out: Outcome) -> Box<sequia::AnalysisView> {
    match out {
        Outcome::Displayed(v) => v,
        other => panic!("expected a displayed analysis, got {other:?}"),
    }
}

#[test]
fn full_response_fills_every_panel() {
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(full_body())]), Catalog::builtin());
    let view = displayed(ctl.submit(&mut page, "  Guachochi "));

    assert_eq!(ctl.source().last_municipio.borrow().as_deref(), Some("Guachochi"));
    let text = |id| page.view.element(id).text.clone();
    assert_eq!(text(ElementId::MunicipioName), "Guachochi");
    assert_eq!(text(ElementId::IndiceValue), "62.5%");
    assert_eq!(text(ElementId::NivelValue), "D3 - Sequía Extrema");
    assert_eq!(page.view.element(ElementId::NivelValue).class, "result-value nivel-d3");
    assert_eq!(text(ElementId::PrecipValue), "1.23 mm");
    assert_eq!(text(ElementId::TempValue), "21.50 °C");
    assert_eq!(text(ElementId::EvapValue), "4.00 mm");

    let advisory = Catalog::builtin()
        .advisory(Locale::Es, DroughtCategory::D3)
        .unwrap();
    assert_eq!(text(ElementId::RecAgricultores), advisory.farmers);
    assert_eq!(text(ElementId::RecGanaderos), advisory.ranchers);

    assert!(page.view.element(ElementId::Result).visible);
    assert!(!page.view.is_loading());
    assert_eq!(page.view.error_message(), None);

    assert_eq!(page.charts.len(), 4);
    assert!(view.chart_failures.is_empty());
    assert_eq!(view.series.len(), 3);
    assert_eq!(view.rain.rainy_days, 2);
    assert_eq!(view.projection.len(), 30);
    assert_eq!(view.projection[0].date, "2024-01-04");
    assert_eq!(view.projection[29].date, "2024-02-02");
    assert!(view.projection.iter().all(|d| d.predicted_mm >= 0.0));

    let canvas = page.view.element(ElementId::RiskCanvas).content.as_deref().unwrap();
    assert!(canvas.contains("<svg"));
}

#[test]
fn rerendering_keeps_one_instance_per_kind() {
    let (surface, counts) = Recording::counted();
    let mut page = Page::new(Box::new(surface));
    let source = Scripted::new([Ok(full_body()), Ok(full_body())]);
    let mut ctl = AnalysisController::new(source, Catalog::builtin());

    ctl.submit(&mut page, "Aldama");
    let first = page.charts.get(ChartKind::Regression).unwrap().config.clone();
    ctl.submit(&mut page, "Aldama");

    let c = *counts.borrow();
    assert_eq!(c.created, 8);
    assert_eq!(c.destroyed, 4);
    assert_eq!(page.charts.len(), 4);
    assert_eq!(page.charts.get(ChartKind::Regression).unwrap().config, first);
}

#[test]
fn one_failing_chart_does_not_stop_the_rest() {
    let (surface, _) = Recording::failing(Some(ChartKind::Scatter));
    let mut page = Page::new(Box::new(surface));
    let mut ctl = AnalysisController::new(Scripted::new([Ok(full_body())]), Catalog::builtin());

    let view = displayed(ctl.submit(&mut page, "Aldama"));
    assert_eq!(view.chart_failures, vec![ChartKind::Scatter]);
    assert!(page.charts.get(ChartKind::Scatter).is_none());
    assert!(page.charts.get(ChartKind::TimeSeries).is_some());
    assert!(page.charts.get(ChartKind::Regression).is_some());
    assert!(page.charts.get(ChartKind::MonthlyBar).is_some());
    assert_eq!(page.view.element(ElementId::IndiceValue).text, "62.5%");
    assert_eq!(page.view.error_message(), None);
}

#[test]
fn response_without_series_clears_old_charts() {
    let mut page = Page::in_memory();
    let source = Scripted::new([Ok(full_body()), Ok(bare_body())]);
    let mut ctl = AnalysisController::new(source, Catalog::builtin());

    ctl.submit(&mut page, "Aldama");
    assert_eq!(page.charts.len(), 4);
    let view = displayed(ctl.submit(&mut page, "Ojinaga"));

    assert!(page.charts.is_empty());
    assert_eq!(view.regression, Err(RegressionError::InsufficientData(0)));
    assert!(view.projection.is_empty());
    assert_eq!(page.view.element(ElementId::IndiceValue).text, "12%");
    assert_eq!(page.view.element(ElementId::RiskCanvas).content, None);
}

#[test]
fn single_day_skips_only_the_regression() {
    let body = json!({
        "success": true,
        "indice_sequia": 30,
        "categoria": "D1",
        "datos": {
            "precipitacion_promedio": 0.5,
            "temperatura_promedio": 25.0,
            "evapotranspiracion_promedio": 6.1
        },
        "series": {"fechas": ["2024-06-01"], "lluvia_mm": [0.5], "temperatura_c": [25.0]}
    });
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(body)]), Catalog::builtin());

    let view = displayed(ctl.submit(&mut page, "Aldama"));
    assert_eq!(view.regression, Err(RegressionError::InsufficientData(1)));
    assert!(page.charts.get(ChartKind::Regression).is_none());
    assert!(page.charts.get(ChartKind::TimeSeries).is_some());
    assert!(page.charts.get(ChartKind::MonthlyBar).is_none());
}

#[test]
fn monthly_totals_are_derived_on_request() {
    let mut body = full_body();
    body.as_object_mut().unwrap().remove("monthly_promedio");
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(body)]), Catalog::builtin())
        .with_derived_monthly(true);

    let view = displayed(ctl.submit(&mut page, "Aldama"));
    assert_eq!(view.monthly.len(), 1);
    assert_eq!(view.monthly[0].month_label, "2024-01");
    assert!((view.monthly[0].precipitation_mm - 3.5).abs() < 1e-9);
    assert!(page.charts.get(ChartKind::MonthlyBar).is_some());
}

#[test]
fn server_message_is_shown_verbatim() {
    let body = json!({"success": false, "error": "municipio no encontrado"});
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(body)]), Catalog::builtin());

    let out = ctl.submit(&mut page, "Atlantis");
    assert!(matches!(out, Outcome::Failed(AnalysisError::Application(Some(_)))));
    assert_eq!(page.view.error_message(), Some("municipio no encontrado"));
    assert!(!page.view.element(ElementId::Result).visible);
    assert!(!page.view.is_loading());
}

#[test]
fn server_message_keeps_surrounding_whitespace() {
    let body = json!({"success": false, "error": " municipio no encontrado "});
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(body)]), Catalog::builtin());

    ctl.submit(&mut page, "Atlantis");
    assert_eq!(page.view.error_message(), Some(" municipio no encontrado "));
}

#[test]
fn unknown_category_is_shown_as_received() {
    let mut unknown = bare_body();
    unknown["categoria"] = json!("D5");
    unknown["nombre_categoria"] = json!("Sequía Catastrófica");
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(
        Scripted::new([Ok(full_body()), Ok(unknown)]),
        Catalog::builtin(),
    );
    displayed(ctl.submit(&mut page, "Guachochi"));
    displayed(ctl.submit(&mut page, "Guachochi"));

    let nivel = page.view.element(ElementId::NivelValue);
    assert_eq!(nivel.text, "D5 - Sequía Catastrófica");
    assert_eq!(nivel.class, "result-value");
    assert_eq!(nivel.category, None);
    assert_eq!(page.view.element(ElementId::RecAgricultores).text, "");
    assert_eq!(page.view.element(ElementId::RecGanaderos).text, "");
    assert_eq!(page.view.element(ElementId::RecAgricultores).category, None);

    let mut store = MemoryStore::default();
    LanguageSwitcher::new(Catalog::builtin()).switch(&mut page, &mut store, Locale::Tara);
    assert_eq!(page.view.element(ElementId::NivelValue).text, "D5 - Sequía Catastrófica");
    assert_eq!(page.view.element(ElementId::RecAgricultores).text, "");
}

#[test]
fn unknown_category_without_name_shows_code_twice() {
    let mut unknown = bare_body();
    unknown["categoria"] = json!("X");
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(unknown)]), Catalog::builtin());
    displayed(ctl.submit(&mut page, "Guachochi"));
    assert_eq!(page.view.element(ElementId::NivelValue).text, "X - X");
}

#[test]
fn transport_failure_uses_generic_message() {
    let err = AnalysisError::Transport("connection refused".into());
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Err(err)]), Catalog::builtin());

    ctl.submit(&mut page, "Aldama");
    assert_eq!(
        page.view.error_message(),
        Some("Error al conectar con el servidor: transport error: connection refused")
    );
    assert!(!page.view.is_loading());
}

#[test]
fn malformed_body_is_a_connectivity_failure() {
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(
        Scripted::new([Ok(json!({"success": true}))]),
        Catalog::builtin(),
    );

    let out = ctl.submit(&mut page, "Aldama");
    match out {
        Outcome::Failed(e) => assert!(e.is_connectivity()),
        other => panic!("unexpected {other:?}"),
    }
    assert!(
        page.view
            .error_message()
            .unwrap()
            .starts_with("Error al conectar con el servidor")
    );
}

#[test]
fn new_submission_clears_previous_error() {
    let mut page = Page::in_memory();
    let source = Scripted::new([Ok(json!({"success": false})), Ok(full_body())]);
    let mut ctl = AnalysisController::new(source, Catalog::builtin());

    ctl.submit(&mut page, "Aldama");
    assert_eq!(page.view.error_message(), Some("Error desconocido"));
    ctl.submit(&mut page, "Aldama");
    assert_eq!(page.view.error_message(), None);
    assert!(page.view.element(ElementId::Result).visible);
}

#[test]
fn overlapping_submission_is_rejected_by_default() {
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::new([Ok(full_body())]), Catalog::builtin());

    let first: Ticket = ctl.begin(&mut page, "Aldama").unwrap();
    assert!(page.view.is_loading());
    assert_eq!(ctl.begin(&mut page, "Ojinaga"), Err(AnalysisError::Busy));

    let response = ctl.fetch(&first);
    displayed(ctl.complete(&mut page, first, response));
    assert_eq!(ctl.source().calls.get(), 1);
    assert_eq!(page.view.element(ElementId::MunicipioName).text, "Aldama");
    assert!(!page.view.is_loading());
}

#[test]
fn stale_response_is_discarded() {
    let mut page = Page::in_memory();
    let mut ctl = AnalysisController::new(Scripted::default(), Catalog::builtin())
        .with_policy(SubmissionPolicy::DiscardStale);

    let older = ctl.begin(&mut page, "Aldama").unwrap();
    let newer = ctl.begin(&mut page, "Ojinaga").unwrap();
    assert!(newer.generation() > older.generation());

    assert!(matches!(
        ctl.complete(&mut page, older, Ok(full_body())),
        Outcome::Discarded
    ));
    assert!(page.view.is_loading());
    assert_eq!(page.view.element(ElementId::MunicipioName).text, "");

    displayed(ctl.complete(&mut page, newer, Ok(full_body())));
    assert_eq!(page.view.element(ElementId::MunicipioName).text, "Ojinaga");
    assert!(!page.view.is_loading());
}
