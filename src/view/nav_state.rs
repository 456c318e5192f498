/// Top level sections of the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Blog,
    Projects,
    About,
    Resume,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Home, Tab::Blog, Tab::Projects, Tab::About, Tab::Resume];

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Home => "Home",
            Tab::Blog => "Blog",
            Tab::Projects => "Projects",
            Tab::About => "About",
            Tab::Resume => "Resume",
        }
    }

    pub fn href(&self) -> &'static str {
        match self {
            Tab::Home => "/",
            Tab::Blog => "/blog",
            Tab::Projects => "/projects",
            Tab::About => "/page/about",
            Tab::Resume => "/resume",
        }
    }

    /// Tab owning a request path, `None` for paths outside the navigation.
    pub fn from_path(path: &str) -> Option<Tab> {
        let path = path.trim_end_matches('/');
        match path {
            "" => Some(Tab::Home),
            "/blog" => Some(Tab::Blog),
            "/projects" => Some(Tab::Projects),
            "/resume" => Some(Tab::Resume),
            p if p.starts_with("/blog/") => Some(Tab::Blog),
            p if p.starts_with("/page/") => Some(Tab::About),
            _ => None,
        }
    }
}

/// Navigation bar state. Every transition returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavState {
    pub menu_open: bool,
    pub active_tab: Tab,
}

impl Default for NavState {
    fn default() -> Self {
        NavState {
            menu_open: false,
            active_tab: Tab::Home,
        }
    }
}

impl NavState {
    pub fn new(active_tab: Tab) -> Self {
        NavState {
            menu_open: false,
            active_tab,
        }
    }

    pub fn open(self) -> Self {
        NavState { menu_open: true, ..self }
    }

    pub fn close(self) -> Self {
        NavState { menu_open: false, ..self }
    }

    pub fn toggle(self) -> Self {
        NavState { menu_open: !self.menu_open, ..self }
    }

    /// Selecting a tab also closes the menu.
    pub fn set_active_tab(self, tab: Tab) -> Self {
        NavState {
            menu_open: false,
            active_tab: tab,
        }
    }

    pub fn links(&self) -> Vec<NavLink> {
        Tab::ALL.iter()
            .map(|tab| NavLink {
                label: tab.label(),
                href: tab.href(),
                active: *tab == self.active_tab,
            })
            .collect()
    }
}

#[derive(Debug, PartialEq, ramhorns::Content)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions() {
        let state = NavState::default();
        assert!(!state.menu_open);

        let opened = state.open();
        assert!(opened.menu_open);
        assert!(!state.menu_open);

        assert_eq!(opened.open(), opened);
        assert_eq!(opened.close(), state);
        assert_eq!(state.toggle(), opened);
        assert_eq!(state.toggle().toggle(), state);
    }

    #[test]
    fn test_set_active_tab_closes_menu() {
        let state = NavState::default().open().set_active_tab(Tab::Projects);
        assert_eq!(state, NavState { menu_open: false, active_tab: Tab::Projects });
    }

    #[test]
    fn test_tab_from_path() {
        assert_eq!(Tab::from_path("/"), Some(Tab::Home));
        assert_eq!(Tab::from_path("/blog/"), Some(Tab::Blog));
        assert_eq!(Tab::from_path("/blog/my-post"), Some(Tab::Blog));
        assert_eq!(Tab::from_path("/page/about"), Some(Tab::About));
        assert_eq!(Tab::from_path("/api/tags"), None);
    }

    #[test]
    fn test_links() {
        let links = NavState::new(Tab::Blog).links();
        assert_eq!(links.len(), 5);
        let active: Vec<&str> = links.iter().filter(|l| l.active).map(|l| l.label).collect();
        assert_eq!(active, ["Blog"]);
    }
}
