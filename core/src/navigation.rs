//! Route table and the authentication gate in front of it.

use std::fmt;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    Datasets,
    Analyses,
    AnalysisConfig { id: String },
    AnalysisResults { id: String },
    PostDetail { id: String },
    Exports,
    Screenshot,
    Settings,
    Chat { id: String },
    NotFound { path: String },
}

impl Route {
    /// Resolve a path. `/` lands on the dataset list; query strings and
    /// trailing slashes are ignored.
    pub fn parse(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] | ["datasets"] => Self::Datasets,
            ["login"] => Self::Login,
            ["analyses"] => Self::Analyses,
            ["analyses", id, "config"] => Self::AnalysisConfig { id: id.to_string() },
            ["analyses", id, "results"] => Self::AnalysisResults { id: id.to_string() },
            ["posts", id] => Self::PostDetail { id: id.to_string() },
            ["exports"] => Self::Exports,
            ["screenshot"] => Self::Screenshot,
            ["settings"] => Self::Settings,
            ["chat", id] => Self::Chat { id: id.to_string() },
            _ => Self::NotFound {
                path: path.to_string(),
            },
        }
    }

    pub fn requires_auth(&self) -> bool {
        !matches!(self, Self::Login)
    }

    pub fn path(&self) -> String {
        match self {
            Self::Login => LOGIN_PATH.to_string(),
            Self::Datasets => "/datasets".to_string(),
            Self::Analyses => "/analyses".to_string(),
            Self::AnalysisConfig { id } => format!("/analyses/{id}/config"),
            Self::AnalysisResults { id } => format!("/analyses/{id}/results"),
            Self::PostDetail { id } => format!("/posts/{id}"),
            Self::Exports => "/exports".to_string(),
            Self::Screenshot => "/screenshot".to_string(),
            Self::Settings => "/settings".to_string(),
            Self::Chat { id } => format!("/chat/{id}"),
            Self::NotFound { path } => path.clone(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Proceed(Route),
    Redirect(String),
}

/// Decide what happens when `path` is visited.
pub fn guard(path: &str, logged_in: bool) -> Navigation {
    let route = Route::parse(path);
    if route.requires_auth() && !logged_in {
        Navigation::Redirect(LOGIN_PATH.to_string())
    } else if route == Route::Login && logged_in {
        Navigation::Redirect(HOME_PATH.to_string())
    } else {
        Navigation::Proceed(route)
    }
}
