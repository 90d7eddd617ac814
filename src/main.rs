use actix_web::{error::ErrorInternalServerError, get, middleware, post, web, App, HttpResponse, HttpServer, Responder};
use const_fnv1a_hash::fnv1a_hash_str_32;
use serde::{Deserialize, Serialize};
use sparqlview::about::About;
use sparqlview::config::{Config, CONFIG_FILE};
use sparqlview::normalize::Table;
use sparqlview::page::{self, ConsolePage, EntityPage, Header, SearchPage};
use sparqlview::resource::{EntityView, SearchHit};
use sparqlview::sequence::{Sequencer, Sequencers, Ticket};
use sparqlview::{graph, Error, Explorer, HttpTransport, RequestMode};
use std::sync::Arc;
use std::time::{Duration, Instant};

static CSS: &str = std::include_str!("../data/sparqlview.css");
/// Clients whose request numbers are remembered, per API route.
const MAX_CLIENTS: usize = 10_000;

struct AppState {
    config: Config,
    explorer: Explorer<HttpTransport>,
    search_sequences: Sequencers,
    entity_sequences: Sequencers,
    /// stylesheet URL with a content hash so that browsers reload it after changes
    css: String,
}

impl AppState {
    fn new(config: Config) -> Self {
        let explorer = Explorer::new(HttpTransport::new(&config.endpoint, config.timeout()));
        AppState {
            explorer,
            search_sequences: Sequencers::new(MAX_CLIENTS),
            entity_sequences: Sequencers::new(MAX_CLIENTS),
            css: format!("sparqlview.css?v={}", fnv1a_hash_str_32(CSS)),
            config,
        }
    }

    fn header(&self) -> Header<'_> {
        Header { title: &self.config.title, css: &self.css }
    }
}

type State = web::Data<AppState>;

/// Runs blocking core code outside of the async workers, logging failures.
async fn blocking<R: Send + 'static>(f: impl FnOnce() -> sparqlview::Result<R> + Send + 'static) -> actix_web::Result<R> {
    match web::block(f).await? {
        Ok(r) => Ok(r),
        Err(e) => {
            log::warn!("{e}");
            Err(e.into())
        }
    }
}

fn html(body: String) -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body)
}

fn render(name: &str, context: &impl serde::Serialize) -> actix_web::Result<HttpResponse> {
    page::render(name, context).map(html).map_err(|e| {
        log::error!("Cannot render template {name}: {e}");
        ErrorInternalServerError(e)
    })
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    lang: Option<String>,
    limit: Option<usize>,
    /// with `seq`: identifies a client whose outdated responses are discarded
    client: Option<String>,
    seq: Option<u64>,
}

async fn search(state: &State, params: &SearchParams) -> actix_web::Result<Vec<SearchHit>> {
    let state = state.clone();
    let q = params.q.clone();
    let lang = params.lang.clone().unwrap_or_else(|| state.config.lang.clone());
    let limit = params.limit.unwrap_or(state.config.search_limit);
    blocking(move || state.explorer.search(&q, &lang, limit)).await
}

#[derive(Deserialize)]
struct EntityParams {
    uri: String,
    lang: Option<String>,
    limit: Option<usize>,
    /// see [SearchParams]
    client: Option<String>,
    seq: Option<u64>,
}

async fn entity(state: &State, params: &EntityParams) -> actix_web::Result<EntityView> {
    let state = state.clone();
    let uri = params.uri.trim().to_owned();
    let lang = params.lang.clone().unwrap_or_else(|| state.config.lang.clone());
    let limit = params.limit.unwrap_or(state.config.relation_limit);
    blocking(move || state.explorer.entity(&uri, &lang, limit)).await
}

#[get("/")]
async fn index(state: State, params: web::Query<SearchParams>) -> actix_web::Result<HttpResponse> {
    let hits = search(&state, &params).await?;
    render("index", &SearchPage::new(state.header(), &params.q, &hits))
}

#[get("/entity")]
async fn entity_page(state: State, params: web::Query<EntityParams>) -> actix_web::Result<HttpResponse> {
    let view = entity(&state, &params).await?;
    let dot = graph::dot(&view.uri, &view.label, &view.outgoing, &view.incoming);
    render("entity", &EntityPage::new(state.header(), &view, &dot))
}

#[get("/graph")]
async fn entity_graph(state: State, params: web::Query<EntityParams>) -> actix_web::Result<HttpResponse> {
    let view = entity(&state, &params).await?;
    let dot = graph::dot(&view.uri, &view.label, &view.outgoing, &view.incoming);
    Ok(HttpResponse::Ok().content_type("text/vnd.graphviz; charset=utf-8").body(dot))
}

fn superseded() -> HttpResponse {
    HttpResponse::Conflict().body("superseded by a newer request")
}

/// Ticket of a numbered request, present when the client sent both `client` and `seq`.
type Sequence = Option<(Arc<Sequencer>, Ticket)>;

/// `None` if the client already sent a newer request.
fn observe(sequencers: &Sequencers, client: Option<&str>, seq: Option<u64>) -> Option<Sequence> {
    match (client, seq) {
        (Some(client), Some(seq)) => {
            let sequencer = sequencers.client(client);
            let ticket = sequencer.observe(seq)?;
            Some(Some((sequencer, ticket)))
        }
        _ => Some(None),
    }
}

/// JSON of the result, failures included, unless a newer request of the same client arrived in the meantime.
fn settle<T: Serialize>(sequence: Sequence, result: actix_web::Result<T>) -> actix_web::Result<HttpResponse> {
    let result = match sequence {
        Some((sequencer, ticket)) => match sequencer.settle(ticket, result) {
            Some(result) => result,
            None => return Ok(superseded()),
        },
        None => result,
    };
    Ok(HttpResponse::Ok().json(result?))
}

#[get("/api/search")]
async fn api_search(state: State, params: web::Query<SearchParams>) -> actix_web::Result<HttpResponse> {
    let Some(sequence) = observe(&state.search_sequences, params.client.as_deref(), params.seq) else {
        return Ok(superseded());
    };
    settle(sequence, search(&state, &params).await)
}

#[get("/api/entity")]
async fn api_entity(state: State, params: web::Query<EntityParams>) -> actix_web::Result<HttpResponse> {
    let Some(sequence) = observe(&state.entity_sequences, params.client.as_deref(), params.seq) else {
        return Ok(superseded());
    };
    settle(sequence, entity(&state, &params).await)
}

#[derive(Deserialize)]
struct ConsoleForm {
    #[serde(default)]
    query: String,
}

/// Runs a console query in form mode, the explorer queries use the raw query mode.
async fn console(state: &State, query: String) -> actix_web::Result<(Table, Duration)> {
    if query.trim().is_empty() {
        return Err(Error::Validation("Please enter a SPARQL query before running.".to_owned()).into());
    }
    let state = state.clone();
    let start = Instant::now();
    let results = blocking(move || state.explorer.transport().execute(&query, RequestMode::Form)).await?;
    Ok((Table::from(&results), start.elapsed()))
}

#[get("/sparql")]
async fn console_page(state: State) -> actix_web::Result<HttpResponse> {
    let query = state.config.examples.first().map_or("", |e| e.query.as_str());
    render("console", &ConsolePage { header: state.header(), query, examples: &state.config.examples, table: None, error: None, elapsed: None })
}

#[post("/sparql")]
async fn console_run(state: State, form: web::Form<ConsoleForm>) -> actix_web::Result<HttpResponse> {
    let query = form.into_inner().query;
    let (table, error, elapsed, status) = match console(&state, query.clone()).await {
        Ok((table, elapsed)) => (Some(table), None, Some(format!("{:.2}s", elapsed.as_secs_f64())), None),
        Err(e) => (None, Some(e.to_string()), None, Some(e.as_response_error().status_code())),
    };
    let page = ConsolePage { header: state.header(), query: &query, examples: &state.config.examples, table, error, elapsed };
    let mut response = render("console", &page)?;
    if let Some(status) = status {
        *response.status_mut() = status;
    }
    Ok(response)
}

#[post("/api/sparql")]
async fn api_sparql(state: State, form: web::Form<ConsoleForm>) -> actix_web::Result<HttpResponse> {
    let (table, _) = console(&state, form.into_inner().query).await?;
    Ok(HttpResponse::Ok().json(table))
}

#[get("/about")]
async fn about(state: State) -> impl Responder {
    HttpResponse::Ok().json(About::new(&state.config))
}

#[get("/sparqlview.css")]
async fn css() -> impl Responder {
    HttpResponse::Ok().content_type("text/css").body(CSS)
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(entity_page)
        .service(entity_graph)
        .service(api_search)
        .service(api_entity)
        .service(console_page)
        .service(console_run)
        .service(api_sparql)
        .service(about)
        .service(css);
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = Config::new().unwrap_or_else(|e| {
        env_logger::init();
        log::error!("Invalid configuration: {e}. Check {CONFIG_FILE} and the SPARQLVIEW_* environment variables.");
        std::process::exit(1);
    });
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level)).init();
    log::info!("{} {} exploring {} (lang {}, timeout {}s)", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"), config.endpoint, config.lang, config.timeout_secs);
    let port = config.port;
    let state = web::Data::new(AppState::new(config));
    log::info!("Serving at http://localhost:{port}/");
    HttpServer::new(move || App::new().app_data(state.clone()).wrap(middleware::Logger::default()).configure(routes)).bind(("0.0.0.0", port))?.run().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;

    /// Nothing listens on the discard port, so any request that reaches the network fails fast.
    fn state() -> State {
        let mut config = Config::new().unwrap();
        config.endpoint = "http://127.0.0.1:9/sparql".to_owned();
        config.timeout_secs = 5;
        web::Data::new(AppState::new(config))
    }

    macro_rules! app {
        () => {
            test::init_service(App::new().app_data(state()).configure(routes)).await
        };
    }

    #[actix_web::test]
    async fn about_json() {
        let app = app!();
        let body: serde_json::Value = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/about").to_request()).await;
        assert_eq!(body["endpoint"], "http://127.0.0.1:9/sparql");
        assert_eq!(body["lang"], "en");
    }

    #[actix_web::test]
    async fn blank_search_is_empty() {
        let app = app!();
        let hits: Vec<serde_json::Value> = test::call_and_read_body_json(&app, test::TestRequest::get().uri("/api/search?q=%20%20").to_request()).await;
        assert!(hits.is_empty());
        let res = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn outdated_search_is_discarded() {
        let app = app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/search?q=&client=tab1&seq=5").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/search?q=&client=tab1&seq=3").to_request()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/search?q=&client=tab2&seq=3").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn outdated_entity_is_discarded() {
        let app = app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/entity?uri=not%20an%20iri&client=tab1&seq=5").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        // overtaken before any query is sent
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/entity?uri=http%3A%2F%2Fx%2Fa&client=tab1&seq=3").to_request()).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/entity?uri=not%20an%20iri&client=tab2&seq=3").to_request()).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        // search numbers are independent of entity numbers
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/search?q=&client=tab1&seq=1").to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn pages_carry_title() {
        let app = app!();
        for uri in ["/", "/sparql"] {
            let body = String::from_utf8(test::call_and_read_body(&app, test::TestRequest::get().uri(uri).to_request()).await.to_vec()).unwrap();
            assert!(body.contains("<title>SPARQLView</title>"), "{uri}");
            assert!(body.contains("sparqlview.css?v="), "{uri}");
        }
    }

    #[actix_web::test]
    async fn invalid_uri_is_bad_request() {
        let app = app!();
        for uri in ["/api/entity?uri=http%3A%2F%2Fx%2Fa%3E%20%3Fp%20%3Fo", "/graph?uri=not%20an%20iri", "/entity?uri=http%3A%2F%2Fx%2Fa&limit=0"] {
            let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{uri}");
        }
    }

    #[actix_web::test]
    async fn unreachable_endpoint() {
        let app = app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/api/entity?uri=http%3A%2F%2Fx%2Fa").to_request()).await;
        assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[actix_web::test]
    async fn empty_console_query() {
        let app = app!();
        let req = test::TestRequest::post().uri("/sparql").set_form([("query", "   ")]).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = String::from_utf8(test::read_body(res).await.to_vec()).unwrap();
        assert!(body.contains("Please enter a SPARQL query before running."));
    }

    #[actix_web::test]
    async fn console_lists_examples() {
        let app = app!();
        let body = test::call_and_read_body(&app, test::TestRequest::get().uri("/sparql").to_request()).await;
        assert!(String::from_utf8(body.to_vec()).unwrap().contains("Most used properties"));
    }

    #[actix_web::test]
    async fn stylesheet() {
        let app = app!();
        let res = test::call_service(&app, test::TestRequest::get().uri("/sparqlview.css").to_request()).await;
        assert_eq!(res.headers().get("content-type").unwrap(), "text/css");
    }
}
