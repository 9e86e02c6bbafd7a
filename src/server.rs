//! HTTP viewer over [`RatesView`]: an HTML page plus a small JSON/CSV API.

use std::str::FromStr;

use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, ContentType, DispositionParam, DispositionType};
use actix_web::{App, HttpResponse, HttpServer, ResponseError, get, middleware, web};
use chrono::{Local, NaiveDate};
use log::error;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::StoreError;
use crate::rate_record::RateRecord;
use crate::view::{self, Conversion, Coverage, DaySummary, RatesView};

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("date {0} is in the future")]
    FutureDate(NaiveDate),

    #[error("invalid amount {0:?}")]
    InvalidAmount(String),

    #[error("no {pair} rate for {date}")]
    UnknownPair { pair: String, date: NaiveDate },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
}

impl ResponseError for ViewError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::FutureDate(_) | Self::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            Self::UnknownPair { .. } => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Csv(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("{self}");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    date: Option<NaiveDate>,
    pair: String,
    amount: String,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    date: Option<NaiveDate>,
    pair: Option<String>,
    amount: Option<String>,
}

#[derive(Serialize)]
struct RatesResponse {
    date: NaiveDate,
    records: Vec<RateRecord>,
    summary: DaySummary,
}

#[derive(Serialize)]
struct ConvertResponse {
    currency_pair: String,
    amount: Decimal,
    #[serde(flatten)]
    conversion: Conversion,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Defaults to today; dates after today are rejected.
fn resolve_date(date: Option<NaiveDate>) -> Result<NaiveDate, ViewError> {
    let today = today();
    match date {
        None => Ok(today),
        Some(d) if d > today => Err(ViewError::FutureDate(d)),
        Some(d) => Ok(d),
    }
}

fn parse_amount(raw: &str) -> Result<Decimal, ViewError> {
    Decimal::from_str(raw.trim()).map_err(|_| ViewError::InvalidAmount(raw.to_string()))
}

/// An amount whose totals don't fit in a `Decimal` is rejected like an unparseable one.
fn convert_amount(record: &RateRecord, amount: Decimal) -> Result<Conversion, ViewError> {
    view::convert(record, amount).ok_or_else(|| ViewError::InvalidAmount(amount.to_string()))
}

#[get("/api/dates")]
async fn dates(view: web::Data<RatesView>) -> Result<HttpResponse, ViewError> {
    let dates = view.list_available_dates().await?;
    Ok(HttpResponse::Ok().json(dates))
}

#[get("/api/rates")]
async fn rates(view: web::Data<RatesView>, query: web::Query<DateQuery>) -> Result<HttpResponse, ViewError> {
    let date = resolve_date(query.date)?;
    let records = view.rates_for_date(date).await?;
    let summary = view::day_summary(&records);

    Ok(HttpResponse::Ok().json(RatesResponse {
        date,
        records,
        summary,
    }))
}

#[get("/api/rates.csv")]
async fn rates_csv(view: web::Data<RatesView>, query: web::Query<DateQuery>) -> Result<HttpResponse, ViewError> {
    let date = resolve_date(query.date)?;
    let records = view.rates_for_date(date).await?;
    let body = view::to_csv(&records)?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(view::csv_file_name(date))],
        })
        .body(body))
}

#[get("/api/convert")]
async fn convert(view: web::Data<RatesView>, query: web::Query<ConvertQuery>) -> Result<HttpResponse, ViewError> {
    let date = resolve_date(query.date)?;
    let amount = parse_amount(&query.amount)?;
    let records = view.rates_for_date(date).await?;

    let record = records
        .iter()
        .find(|r| r.currency_pair == query.pair)
        .ok_or_else(|| ViewError::UnknownPair {
            pair: query.pair.clone(),
            date,
        })?;

    Ok(HttpResponse::Ok().json(ConvertResponse {
        currency_pair: record.currency_pair.clone(),
        amount,
        conversion: convert_amount(record, amount)?,
    }))
}

#[get("/")]
async fn index(view: web::Data<RatesView>, query: web::Query<PageQuery>) -> Result<HttpResponse, ViewError> {
    let today = today();
    // The date picker is bounded, so a future date is clamped rather than rejected.
    let date = query.date.map_or(today, |d| d.min(today));
    let coverage = Coverage::from_dates(&view.list_available_dates().await?);
    let records = view.rates_for_date(date).await?;

    let page = render_page(&PageModel {
        today,
        date,
        coverage,
        records: &records,
        pair: query.pair.as_deref(),
        amount: query.amount.as_deref(),
    });
    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(page))
}

struct PageModel<'a> {
    today: NaiveDate,
    date: NaiveDate,
    coverage: Coverage,
    records: &'a [RateRecord],
    pair: Option<&'a str>,
    amount: Option<&'a str>,
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn render_page(model: &PageModel<'_>) -> String {
    let mut html = String::new();
    let date_str = model.date.format("%Y-%m-%d");

    html.push_str(
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>HDFC Forex Rate Tracker</title></head><body>\
         <h1>HDFC Bank Forex Rate Tracker</h1><p><strong>TT Selling Rates</strong> for foreign currencies to INR</p>",
    );

    html.push_str("<aside><h2>About</h2>");
    if let (Some(latest), Some(oldest)) = (model.coverage.latest, model.coverage.oldest) {
        html.push_str(&format!(
            "<p>{} days of data available</p><p>Latest: {latest}</p><p>Oldest: {oldest}</p>",
            model.coverage.days
        ));
    }
    html.push_str("</aside>");

    html.push_str(&format!(
        "<form method=\"get\" action=\"/\"><label>Choose a date \
         <input type=\"date\" name=\"date\" value=\"{date_str}\" max=\"{}\"></label> \
         <button type=\"submit\">Show</button></form>",
        model.today.format("%Y-%m-%d")
    ));

    html.push_str(&format!("<h2>Forex Rates for {}</h2>", model.date.format("%d %B %Y")));

    if model.records.is_empty() {
        html.push_str(&format!(
            "<p class=\"warning\">No data available for {date_str}</p></body></html>"
        ));
        return html;
    }

    html.push_str(
        "<table><thead><tr><th>Currency Pair</th><th>TT Buying (INR)</th>\
         <th>TT Selling (INR)</th><th>Last Updated</th></tr></thead><tbody>",
    );
    for record in model.records {
        html.push_str(&format!(
            "<tr><td>{}</td><td>₹{:.4}</td><td>₹{:.4}</td><td>{}</td></tr>",
            escape(&record.currency_pair),
            record.tt_buying,
            record.tt_selling,
            record.captured_at.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    html.push_str("</tbody></table>");

    html.push_str(&format!(
        "<p><a href=\"/api/rates.csv?date={date_str}\" download>Download as CSV</a></p>"
    ));

    let summary = view::day_summary(model.records);
    html.push_str(&format!(
        "<ul><li>Total Pairs: {}</li><li>Data Date: {date_str}</li>",
        summary.total_pairs
    ));
    if let Some(highest) = summary.highest_selling {
        html.push_str(&format!("<li>Highest Rate: ₹{highest:.2}</li>"));
    }
    html.push_str("</ul>");

    render_converter(&mut html, model);
    html.push_str("</body></html>");
    html
}

fn render_converter(html: &mut String, model: &PageModel<'_>) {
    let date_str = model.date.format("%Y-%m-%d");
    let amount = model.amount.unwrap_or("1");

    html.push_str(&format!(
        "<h2>Currency Converter</h2><form method=\"get\" action=\"/\">\
         <input type=\"hidden\" name=\"date\" value=\"{date_str}\"><select name=\"pair\">"
    ));
    for record in model.records {
        let selected = if model.pair == Some(record.currency_pair.as_str()) {
            " selected"
        } else {
            ""
        };
        let pair = escape(&record.currency_pair);
        html.push_str(&format!("<option value=\"{pair}\"{selected}>{pair}</option>"));
    }
    html.push_str(&format!(
        "</select> <input type=\"number\" name=\"amount\" step=\"any\" value=\"{}\"> \
         <button type=\"submit\">Convert</button></form>",
        escape(amount)
    ));

    let Some(pair) = model.pair else {
        return;
    };
    let Some(record) = model.records.iter().find(|r| r.currency_pair == pair) else {
        html.push_str(&format!("<p class=\"warning\">No {} rate for {date_str}</p>", escape(pair)));
        return;
    };
    match parse_amount(amount).and_then(|value| convert_amount(record, value)) {
        Ok(conversion) => {
            html.push_str(&format!(
                "<p>At TT Buying: ₹{:.2}</p><p>At TT Selling: ₹{:.2}</p>",
                conversion.buying_total, conversion.selling_total
            ));
        }
        Err(e) => {
            html.push_str(&format!("<p class=\"warning\">{}</p>", escape(&e.to_string())));
        }
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(dates)
        .service(rates)
        .service(rates_csv)
        .service(convert);
}

/// Serves the viewer until the process is stopped.
pub async fn run(addr: &str, view: RatesView) -> std::io::Result<()> {
    let data = web::Data::new(view);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    })
    .bind(addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RateStore;
    use actix_web::test;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    async fn seeded_view() -> (RatesView, NaiveDate) {
        let store = RateStore::open_in_memory().await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let captured_at = date.and_hms_opt(9, 30, 0).unwrap();
        for (pair, buying, selling) in [
            ("USD-INR", dec!(83.10), dec!(83.50)),
            ("EUR-INR", dec!(90.10), dec!(90.60)),
            ("<b>X</b>", dec!(1), dec!(2)),
        ] {
            store
                .upsert(&RateRecord {
                    date,
                    currency_pair: pair.to_string(),
                    tt_buying: buying,
                    tt_selling: selling,
                    captured_at,
                })
                .await
                .unwrap();
        }
        (RatesView::new(store), date)
    }

    macro_rules! app {
        ($view:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($view))
                    .configure(configure),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn test_dates_endpoint() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get().uri("/api/dates").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!(["2024-03-05"]));
    }

    #[actix_web::test]
    async fn test_rates_endpoint_ordered_with_summary() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get().uri("/api/rates?date=2024-03-05").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        let pairs: Vec<&str> = body["records"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["currency_pair"].as_str().unwrap())
            .collect();
        assert_eq!(pairs, vec!["<b>X</b>", "EUR-INR", "USD-INR"]);
        assert_eq!(body["summary"]["total_pairs"], 3);
        assert_eq!(body["summary"]["highest_selling"], "90.60");
    }

    #[actix_web::test]
    async fn test_empty_date_is_not_an_error() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get().uri("/api/rates?date=2024-01-01").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["records"], serde_json::json!([]));
    }

    #[actix_web::test]
    async fn test_future_date_rejected() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get().uri("/api/rates?date=9999-01-01").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_convert_endpoint() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get()
            .uri("/api/convert?date=2024-03-05&pair=USD-INR&amount=1000")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let buying = Decimal::from_str(body["buying_total"].as_str().unwrap()).unwrap();
        let selling = Decimal::from_str(body["selling_total"].as_str().unwrap()).unwrap();
        assert_eq!(buying, dec!(83100.0));
        assert_eq!(selling, dec!(83500.0));
    }

    #[actix_web::test]
    async fn test_convert_errors() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get()
            .uri("/api/convert?date=2024-03-05&pair=CHF-INR&amount=1")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::get()
            .uri("/api/convert?date=2024-03-05&pair=USD-INR&amount=lots")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_convert_overflowing_amount_is_bad_request() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get()
            .uri("/api/convert?date=2024-03-05&pair=USD-INR&amount=1000000000000000000000000000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("invalid amount"));
    }

    #[actix_web::test]
    async fn test_index_warns_on_overflowing_amount() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get()
            .uri("/?date=2024-03-05&pair=USD-INR&amount=1000000000000000000000000000")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("<p class=\"warning\">invalid amount"));
        assert!(!html.contains("At TT Buying"));
        assert!(html.contains("₹83.1000"));
    }

    #[actix_web::test]
    async fn test_csv_download() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get().uri("/api/rates.csv?date=2024-03-05").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let disposition = resp
            .headers()
            .get("content-disposition")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("hdfc_forex_2024-03-05.csv"));

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        assert!(text.starts_with("Currency Pair,TT Buying (INR),TT Selling (INR),Last Updated"));
        assert!(text.contains("USD-INR,83.10,83.50,2024-03-05 09:30:00"));
    }

    #[actix_web::test]
    async fn test_index_page_renders_table_and_conversion() {
        let (view, _) = seeded_view().await;
        let app = app!(view);

        let req = test::TestRequest::get()
            .uri("/?date=2024-03-05&pair=USD-INR&amount=1000")
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        let html = std::str::from_utf8(&body).unwrap();

        assert!(html.contains("₹83.1000"));
        assert!(html.contains("Highest Rate: ₹90.60"));
        assert!(html.contains("At TT Buying: ₹83100.00"));
        assert!(html.contains("At TT Selling: ₹83500.00"));
        assert!(html.contains("&lt;b&gt;X&lt;/b&gt;"));
        assert!(!html.contains("<b>X</b>"));
    }

    #[actix_web::test]
    async fn test_index_without_store() {
        let dir = tempfile::tempdir().unwrap();
        let view = RatesView::new(RateStore::open_read_only(&dir.path().join("missing.db")));
        let app = app!(view);

        let req = test::TestRequest::get().uri("/?date=2024-03-05").to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());
        let body = test::read_body(resp).await;
        let html = std::str::from_utf8(&body).unwrap();
        assert!(html.contains("No data available for 2024-03-05"));
    }
}
