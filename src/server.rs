use std::io;
use std::path::Path;
use std::sync::Arc;

use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use serde::Deserialize;
use spdlog::{error, info, warn};

use crate::config::Config;
use crate::integrations::github::{GithubClient, ProjectKind, ProjectPage};
use crate::integrations::ExternalError;
use crate::post_processor::{get_file, PageError, SiteContext};
use crate::query_string::{ListingParams, QueryString};
use crate::view::nav_state::{NavState, Tab};

struct ServerState {
    site: SiteContext,
    github: Option<GithubClient>,
}

impl ServerState {
    async fn projects(&self, kind: ProjectKind, cursor: Option<&str>) -> Result<ProjectPage, ExternalError> {
        let Some(ref github) = self.github else {
            return Err(ExternalError::NotConfigured { service: "GitHub" });
        };
        github.fetch(kind, cursor).await.inspect_err(|e| {
            warn!("Project listing {:?} unavailable: {}", kind, e);
        })
    }
}

type State = web::types::State<Arc<ServerState>>;

fn nav_for(req: &HttpRequest) -> NavState {
    NavState::new(Tab::from_path(req.path()).unwrap_or(Tab::Home))
}

fn query_of(req: &HttpRequest) -> QueryString {
    QueryString::from(req.uri().query().unwrap_or_default())
}

fn html(body: String) -> web::HttpResponse {
    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

fn json<T: serde::Serialize>(value: &T) -> web::HttpResponse {
    match serde_json::to_string(value) {
        Ok(body) => web::HttpResponse::Ok()
            .content_type("application/json")
            .body(body),
        Err(e) => {
            error!("Error encoding JSON response: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

fn not_found(state: &ServerState, req: &HttpRequest) -> web::HttpResponse {
    web::HttpResponse::NotFound()
        .content_type("text/html; charset=utf-8")
        .body(state.site.render_not_found(&nav_for(req)))
}

/// Missing content answers 404, anything else 500 with a link back to the same URL.
fn page_response(state: &ServerState, req: &HttpRequest, rendered: Result<String, PageError>) -> web::HttpResponse {
    match rendered {
        Ok(body) => html(body),
        Err(e) if e.is_not_found() => not_found(state, req),
        Err(e) => {
            error!("Error rendering {}: {}", req.path(), e);
            let retry_url = match req.uri().query() {
                Some(query) => format!("{}?{}", req.path(), query),
                None => req.path().to_string(),
            };
            web::HttpResponse::InternalServerError()
                .content_type("text/html; charset=utf-8")
                .body(state.site.render_error(&retry_url, &nav_for(req)))
        }
    }
}

#[web::get("/")]
async fn index(req: HttpRequest, state: State) -> web::HttpResponse {
    let rendered = state.site.render_index(&nav_for(&req));
    page_response(&state, &req, rendered)
}

#[web::get("/blog")]
async fn blog(req: HttpRequest, state: State) -> web::HttpResponse {
    let params = ListingParams::from_query(&query_of(&req));
    let rendered = state.site.render_list(&params, &nav_for(&req));
    page_response(&state, &req, rendered)
}

#[web::get("/blog/{slug}")]
async fn post(req: HttpRequest, slug: web::types::Path<String>, state: State) -> web::HttpResponse {
    let rendered = state.site.render_post(&slug, &nav_for(&req));
    page_response(&state, &req, rendered)
}

#[web::get("/page/{name}")]
async fn page(req: HttpRequest, name: web::types::Path<String>, state: State) -> web::HttpResponse {
    let rendered = state.site.render_page(&name, &nav_for(&req));
    page_response(&state, &req, rendered)
}

#[web::get("/projects")]
async fn projects(req: HttpRequest, state: State) -> web::HttpResponse {
    let (repos, gists) = tokio::join!(
        state.projects(ProjectKind::Repositories, None),
        state.projects(ProjectKind::Gists, None),
    );
    let rendered = state.site.render_projects(&repos, &gists, &nav_for(&req));
    page_response(&state, &req, rendered)
}

#[derive(Deserialize)]
struct ProjectsQuery {
    kind: Option<String>,
    cursor: Option<String>,
}

#[web::get("/api/projects")]
async fn api_projects(query: web::types::Query<ProjectsQuery>, state: State) -> web::HttpResponse {
    let kind = query.kind.as_deref().unwrap_or("repos");
    let Some(kind) = ProjectKind::parse(kind) else {
        return web::HttpResponse::BadRequest()
            .body(format!("Unknown project kind {}", kind));
    };

    let cursor = query.cursor.as_deref().filter(|c| !c.is_empty());
    match state.projects(kind, cursor).await {
        Ok(listing) => json(&listing),
        Err(_) => web::HttpResponse::BadGateway()
            .body("Project listing is unavailable right now"),
    }
}

#[web::get("/api/categories")]
async fn api_categories(state: State) -> web::HttpResponse {
    match state.site.category_view() {
        Ok(categories) => json(&categories),
        Err(e) => {
            error!("Error listing categories: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

#[web::get("/api/tags")]
async fn api_tags(state: State) -> web::HttpResponse {
    match state.site.tag_view() {
        Ok(tags) => json(&tags),
        Err(e) => {
            error!("Error listing tags: {}", e);
            web::HttpResponse::InternalServerError().finish()
        }
    }
}

fn attachment_type(file: &Path) -> &'static str {
    match file.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

#[web::get("/resume")]
async fn resume(req: HttpRequest, state: State) -> web::HttpResponse {
    let Some(ref resume_file) = state.site.config.paths.resume_file else {
        return not_found(&state, &req);
    };

    let bytes = match tokio::fs::read(resume_file).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading resume {}: {}", resume_file.display(), e);
            return not_found(&state, &req);
        }
    };

    let file_name = resume_file.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("resume");
    web::HttpResponse::Ok()
        .content_type(attachment_type(resume_file))
        .header("Content-Disposition", format!("attachment; filename=\"{}\"", file_name))
        .body(bytes)
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: State) -> Result<NamedFile, web::Error> {
    get_file(&state.site.config.paths.public_dir, &path)
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let github = match config.code_host {
        Some(ref code_host) => GithubClient::from_config(code_host)
            .inspect_err(|e| warn!("Projects will be unavailable: {}", e))
            .ok(),
        None => None,
    };

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Starting server on {}:{} ({:?} mode)", bind_addr, bind_port, config.site.mode);

    let app_state = Arc::new(ServerState {
        site: SiteContext::new(config),
        github,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(blog)
            .service(post)
            .service(page)
            .service(projects)
            .service(api_projects)
            .service(api_categories)
            .service(api_tags)
            .service(resume)
            .service(public_files)
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_attachment_type() {
        assert_eq!(attachment_type(&PathBuf::from("cv/Jane.PDF")), "application/pdf");
        assert_eq!(attachment_type(&PathBuf::from("cv/jane.docx")), "application/octet-stream");
        assert_eq!(attachment_type(&PathBuf::from("resume")), "application/octet-stream");
    }
}
