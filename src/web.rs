//! Browser front end: one form, one result page, one download.
//!
//! The server keeps no session state. The result page embeds the generated
//! Markdown in a hidden field of the download form, so `POST /download`
//! re-renders the PDF from what the browser sends back instead of caching
//! anything per user.
//!
//! | Route            | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | `GET /`          | empty trip form                                |
//! | `POST /plan`     | validate, generate, show itinerary inline      |
//! | `POST /download` | render submitted Markdown as a PDF attachment  |

use crate::document::html::{escape_html, markdown_to_html};
use crate::error::RequestError;
use crate::planner::TravelPlanner;
use crate::request::{document_filename, TripRequest};
use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

type AppState = Arc<TravelPlanner>;

/// Fields of the trip form. Missing fields arrive as empty strings.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlanForm {
    pub destination: String,
    pub days: String,
    pub interests: String,
    pub guardrails: String,
}

/// Hidden fields posted back by the download button.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DownloadForm {
    pub destination: String,
    pub days: String,
    pub markdown: String,
}

/// Build the application router.
pub fn router(planner: Arc<TravelPlanner>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan))
        .route("/download", post(download))
        .with_state(planner)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(planner: TravelPlanner, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(Arc::new(planner));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Travel planner running at http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}

async fn index() -> Html<String> {
    Html(page(&form_html(&PlanForm::default()), ""))
}

async fn plan(State(planner): State<AppState>, Form(form): Form<PlanForm>) -> Response {
    let request = match TripRequest::from_form(
        &form.destination,
        &form.days,
        &form.interests,
        &form.guardrails,
    ) {
        Ok(r) => r,
        Err(e) => {
            warn!("Rejected form: {}", e);
            let body = page(&form_html(&form), &notice("warning", &request_message(&e)));
            return (StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response();
        }
    };

    match planner.generate_itinerary(&request).await {
        Ok(itinerary) => {
            let result = format!(
                "{notice}\n<p class=\"model\">Generated with {model}</p>\n\
<article class=\"itinerary\">\n{itinerary}</article>\n\
<form method=\"post\" action=\"/download\">\n\
<input type=\"hidden\" name=\"destination\" value=\"{dest}\">\n\
<input type=\"hidden\" name=\"days\" value=\"{days}\">\n\
<input type=\"hidden\" name=\"markdown\" value=\"{md}\">\n\
<button type=\"submit\">Download PDF</button>\n</form>",
                notice = notice("success", "Itinerary Ready!"),
                model = escape_html(&itinerary.model),
                itinerary = markdown_to_html(&itinerary.markdown),
                dest = escape_html(request.destination()),
                days = request.duration_days(),
                md = escape_html(&itinerary.markdown),
            );
            Html(page(&form_html(&form), &result)).into_response()
        }
        Err(e) => {
            let body = page(&form_html(&form), &notice("error", &e.to_string()));
            (StatusCode::BAD_GATEWAY, Html(body)).into_response()
        }
    }
}

async fn download(State(planner): State<AppState>, Form(form): Form<DownloadForm>) -> Response {
    let request = match TripRequest::from_form(&form.destination, &form.days, "", "") {
        Ok(r) => r,
        Err(e) => return (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()).into_response(),
    };
    if form.markdown.trim().is_empty() {
        return (StatusCode::UNPROCESSABLE_ENTITY, "Nothing to render").into_response();
    }

    match planner.render(&request, &form.markdown) {
        Ok(doc) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                document_filename(request.destination())
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                doc.bytes,
            )
                .into_response()
        }
        Err(e) => {
            warn!("PDF generation error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

fn request_message(e: &RequestError) -> String {
    match e {
        RequestError::MissingDestination => {
            "Please provide at least a Destination and Number of Days.".to_string()
        }
        other => other.to_string(),
    }
}

fn notice(kind: &str, text: &str) -> String {
    format!(
        "<div class=\"notice {kind}\">{}</div>",
        escape_html(text)
    )
}

fn form_html(form: &PlanForm) -> String {
    format!(
        r#"<form method="post" action="/plan">
<label>1) Destination to Travel<input name="destination" placeholder="e.g., Tokyo, Japan" value="{dest}"></label>
<label>2) Number of Days<input name="days" placeholder="e.g., 5 days" value="{days}"></label>
<label>3) Special Interests<textarea name="interests" placeholder="e.g., Museums, Food &amp; Cuisine, Photography">{interests}</textarea></label>
<label>4) Guardrails / Preferences<textarea name="guardrails" placeholder="e.g., Wheelchair accessible, kid-friendly, no spicy food">{guardrails}</textarea></label>
<button type="submit">Generate Travel Plan</button>
</form>
<p><a href="/">Reset Form &amp; Clear Plan</a></p>"#,
        dest = escape_html(&form.destination),
        days = escape_html(&form.days),
        interests = escape_html(&form.interests),
        guardrails = escape_html(&form.guardrails),
    )
}

fn page(form: &str, result: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Personalized Travel Planner</title>
<style>
body {{ font-family: Helvetica, Arial, sans-serif; max-width: 52rem; margin: 2rem auto; padding: 0 1rem; }}
label {{ display: block; margin: .6rem 0; }}
input, textarea {{ display: block; width: 100%; }}
.notice {{ padding: .6rem; margin: 1rem 0; }}
.warning {{ background: #fff4d6; }} .error {{ background: #fde2e1; }} .success {{ background: #e3f6e5; }}
</style>
</head>
<body>
<h1>Personalized Travel Planner</h1>
{form}
{result}
</body>
</html>
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::pipeline::llm::{ChatBackend, ChatReply, GenerationOptions, PromptPair, ProviderFailure};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn chat(
            &self,
            _model: &str,
            _prompt: &PromptPair,
            _options: &GenerationOptions,
        ) -> Result<ChatReply, ProviderFailure> {
            Ok(ChatReply {
                content: "## Trip Overview\nVisit the **Golden Pavilion** <early>".into(),
                ..Default::default()
            })
        }
    }

    fn app() -> Router {
        let config = PlannerConfig::builder()
            .models(["gpt-4o"])
            .backend(Arc::new(EchoBackend))
            .build()
            .unwrap();
        router(Arc::new(TravelPlanner::new(config).unwrap()))
    }

    fn form_post(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_string(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn index_shows_form() {
        let resp = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("Generate Travel Plan"));
        assert!(html.contains("name=\"guardrails\""));
    }

    #[tokio::test]
    async fn plan_renders_itinerary_inline() {
        let resp = app()
            .oneshot(form_post(
                "/plan",
                "destination=Kyoto&days=3+days&interests=tea&guardrails=",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let html = body_string(resp).await;
        assert!(html.contains("<h2>Trip Overview</h2>"));
        assert!(html.contains("<strong>Golden Pavilion</strong>"));
        assert!(html.contains("&lt;early&gt;"));
        assert!(html.contains("action=\"/download\""));
        assert!(html.contains("name=\"days\" value=\"3\""));
    }

    #[tokio::test]
    async fn plan_without_destination_warns() {
        let resp = app()
            .oneshot(form_post("/plan", "destination=&days=3"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_string(resp).await;
        assert!(html.contains("Please provide at least a Destination"));
    }

    #[tokio::test]
    async fn download_returns_named_pdf() {
        let resp = app()
            .oneshot(form_post(
                "/download",
                "destination=Kyoto&days=3&markdown=%23%23+Trip+Overview%0AHi",
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            resp.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"kyoto-travel-plan.pdf\""
        );
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
