use crate::config::EnvConfig;
use crate::pages::{EditorPage, LandingPage, NotFoundPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App(env: EnvConfig) -> impl IntoView {
    provide_context(AppContext(AppState::new(env)));

    view! {
        <Router>
            <Routes fallback=|| view! { <NotFoundPage /> }>
                <Route path=path!("") view=LandingPage />
                <Route path=path!("write/:doc_id") view=EditorPage />
            </Routes>
        </Router>
    }
}
