//! Screen routing with a single authentication gate.

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => LOGIN_PATH,
            Self::Dashboard => DASHBOARD_PATH,
        }
    }

    fn from_path(path: &str) -> Self {
        match path.trim_end_matches('/') {
            "/login" | "login" => Self::Login,
            _ => Self::Dashboard,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub route: Route,
    pub redirected: bool,
}

/// Maps a requested path to the route actually shown.
///
/// Unknown paths fall back to the dashboard before the gate is applied.
pub fn resolve(path: &str, authenticated: bool) -> Resolution {
    let requested = Route::from_path(path);
    let route = match (requested, authenticated) {
        (Route::Dashboard, false) => Route::Login,
        (Route::Login, true) => Route::Dashboard,
        (route, _) => route,
    };
    Resolution {
        route,
        redirected: route != requested || path != requested.path(),
    }
}

/// Current route, always kept consistent with the authentication gate.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: Route,
}

impl Navigator {
    pub fn new(authenticated: bool) -> Self {
        Self {
            current: resolve(DASHBOARD_PATH, authenticated).route,
        }
    }

    pub fn current(&self) -> Route {
        self.current
    }

    pub fn navigate(&mut self, path: &str, authenticated: bool) -> Route {
        let resolution = resolve(path, authenticated);
        if resolution.redirected {
            tracing::debug!(path, to = resolution.route.path(), "redirected");
        }
        self.current = resolution.route;
        self.current
    }

    /// Re-applies the gate to the current route after the session changed.
    pub fn revalidate(&mut self, authenticated: bool) -> Route {
        self.current = resolve(self.current.path(), authenticated).route;
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_route_redirects_to_login_when_signed_out() {
        let res = resolve("/", false);
        assert_eq!(res.route, Route::Login);
        assert!(res.redirected);
    }

    #[test]
    fn login_redirects_to_dashboard_when_signed_in() {
        let res = resolve("/login", true);
        assert_eq!(res.route, Route::Dashboard);
        assert!(res.redirected);
    }

    #[test]
    fn unknown_paths_go_through_the_dashboard() {
        assert_eq!(resolve("/reports/2024", true).route, Route::Dashboard);
        assert!(resolve("/reports/2024", true).redirected);
        assert_eq!(resolve("/reports/2024", false).route, Route::Login);
    }

    #[test]
    fn direct_hits_are_not_redirects() {
        assert_eq!(
            resolve("/", true),
            Resolution {
                route: Route::Dashboard,
                redirected: false
            }
        );
        assert!(!resolve("/login", false).redirected);
    }

    #[test]
    fn signing_out_revalidates_to_login() {
        let mut nav = Navigator::new(true);
        assert_eq!(nav.current(), Route::Dashboard);
        assert_eq!(nav.revalidate(false), Route::Login);
        assert_eq!(nav.current(), Route::Login);
    }

    #[test]
    fn login_then_visit_login_lands_on_dashboard() {
        let mut nav = Navigator::new(false);
        assert_eq!(nav.current(), Route::Login);

        assert_eq!(nav.navigate(DASHBOARD_PATH, true), Route::Dashboard);
        assert_eq!(nav.navigate(LOGIN_PATH, true), Route::Dashboard);
    }

    #[test]
    fn dashboard_is_unreachable_while_signed_out() {
        let mut nav = Navigator::new(false);
        assert_eq!(nav.navigate(DASHBOARD_PATH, false), Route::Login);
        assert_eq!(nav.revalidate(false), Route::Login);
    }
}
