use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardFooter, CardHeader, CardTitle, FieldError, Input, Label, Spinner,
};
use crate::dom::BrowserPlatform;
use crate::models::{FormatCommand, InlineStyle, SessionState, StyleProperty};
use crate::state::{AppContext, EditorSignals, PageController};
use crate::util::editor_path;
use icons::{Bold, Copy as CopyIcon, Italic, Settings, X};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::use_params_map;

const FONT_FAMILIES: &[(&str, &str)] = &[
    ("", "Default font"),
    ("Georgia, serif", "Georgia"),
    ("'Times New Roman', serif", "Times New Roman"),
    ("Arial, sans-serif", "Arial"),
    ("'Courier New', monospace", "Courier New"),
];

const FONT_SIZES: &[(&str, &str)] = &[
    ("", "Default size"),
    ("12px", "12"),
    ("14px", "14"),
    ("16px", "16"),
    ("18px", "18"),
    ("24px", "24"),
    ("32px", "32"),
];

#[component]
pub fn LandingPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let loading: RwSignal<bool> = RwSignal::new(false);
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let on_new = move |_| {
        let api_client = app_state.0.api_client.clone();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match api_client.create_document().await {
                Ok(doc) => {
                    tracing::info!(doc_id = %doc.doc_id, "document created");
                    let _ = window().location().set_href(&editor_path(&doc.doc_id));
                }
                Err(e) => {
                    tracing::error!(error = %e, "creating document failed");
                    error.set(Some(e.to_string()));
                    loading.set(false);
                }
            }
        });
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-md flex-col justify-center px-4 py-12">
                <Card>
                    <CardHeader>
                        <CardTitle class="text-xl">"Manuscripta"</CardTitle>
                        <CardDescription>
                            "Write in the browser, share by link, lock with a password."
                        </CardDescription>
                    </CardHeader>

                    <CardContent>
                        {move || {
                            error.get().map(|e| view! {
                                <Alert class="mb-3 border-destructive/30">
                                    <AlertDescription class="text-destructive">{e}</AlertDescription>
                                </Alert>
                            })
                        }}

                        <Button class="w-full" attr:disabled=move || loading.get() on:click=on_new>
                            <Show when=move || loading.get()>
                                <Spinner />
                            </Show>
                            {move || if loading.get() { "Creating..." } else { "New document" }}
                        </Button>
                    </CardContent>

                    <CardFooter>
                        <div class="text-xs text-muted-foreground">
                            "New documents are private until you choose otherwise."
                        </div>
                    </CardFooter>
                </Card>
            </div>
        </div>
    }
}

#[component]
pub fn NotFoundPage() -> impl IntoView {
    view! {
        <div class="px-4 py-8 text-xs text-muted-foreground">
            "Document not found. "
            <a class="text-primary underline underline-offset-4" href="/">"Start a new one"</a>
        </div>
    }
}

/// `/write/:doc_id`: the editor, or the password prompt for a locked private document.
#[component]
pub fn EditorPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let params = use_params_map();
    let route_doc_id = params.with_untracked(|p| p.get("doc_id"));

    let globals = app_state.0.globals.clone();
    match globals.session_state(route_doc_id) {
        None => view! { <NotFoundPage /> }.into_any(),
        Some(session) if globals.is_locked => view! { <PasswordPromptPage session /> }.into_any(),
        Some(session) => view! {
            <EditorWorkspace session initial_content=globals.initial_content.clone() />
        }
        .into_any(),
    }
}

fn page_controller(
    app_state: &AppContext,
    session: SessionState,
    initial_content: String,
    signals: EditorSignals,
) -> StoredValue<PageController, LocalStorage> {
    StoredValue::new_local(PageController::new(
        session,
        initial_content,
        app_state.0.env.save_delay_ms,
        app_state.0.api_client.clone(),
        signals,
        BrowserPlatform,
    ))
}

#[component]
fn PasswordPromptPage(session: SessionState) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let signals = EditorSignals::new(false);
    let ctrl = page_controller(&app_state, session, String::new(), signals);

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto flex min-h-screen w-full max-w-sm flex-col justify-center px-4 py-10">
                <Card>
                    <CardHeader>
                        <CardTitle class="text-lg">"This document is private"</CardTitle>
                        <CardDescription class="text-xs">
                            "Enter the document password to open it."
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <UnlockForm ctrl signals />
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[component]
fn UnlockForm(
    ctrl: StoredValue<PageController, LocalStorage>,
    signals: EditorSignals,
    #[prop(optional)] on_cancel: Option<Callback<()>>,
) -> impl IntoView {
    let password: RwSignal<String> = RwSignal::new(String::new());

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let password_val = password.get_untracked();
        let c = ctrl.get_value();
        spawn_local(async move {
            let _ = c.unlock(&password_val).await;
        });
    };

    view! {
        <form class="flex flex-col gap-3" on:submit=on_submit>
            <div class="flex flex-col gap-1.5">
                <Label html_for="unlock-password" class="text-xs">"Password"</Label>
                <Input
                    id="unlock-password"
                    r#type="password"
                    autocomplete="current-password"
                    bind_value=password
                    disabled=signals.unlock_busy
                    required=true
                    autofocus=true
                />
            </div>

            {move || signals.unlock_error.get().map(|e| view! { <FieldError>{e}</FieldError> })}

            <div class="flex items-center gap-2">
                <Button attr:disabled=move || signals.unlock_busy.get()>
                    <Show when=move || signals.unlock_busy.get()>
                        <Spinner />
                    </Show>
                    "Unlock"
                </Button>
                {on_cancel.map(|cb| view! {
                    <Button
                        variant=ButtonVariant::Ghost
                        on:click=move |ev: web_sys::MouseEvent| {
                            ev.prevent_default();
                            cb.run(());
                        }
                    >
                        "Cancel"
                    </Button>
                })}
            </div>
        </form>
    }
}

#[component]
fn EditorWorkspace(session: SessionState, initial_content: String) -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let signals = EditorSignals::new(session.needs_password_set);
    let read_only = session.read_only;
    let ctrl = page_controller(&app_state, session, initial_content, signals);

    let settings_open: RwSignal<bool> = RwSignal::new(false);
    let unlock_open: RwSignal<bool> = RwSignal::new(false);
    let new_password: RwSignal<String> = RwSignal::new(String::new());

    // The content region must be mounted before the initial HTML can be injected.
    Effect::new(move |initialized: Option<bool>| {
        if initialized == Some(true) {
            return true;
        }
        if signals.content_ref.get().is_some() {
            ctrl.with_value(|c| c.initialize());
            true
        } else {
            false
        }
    });

    // Cmd/Ctrl+S inside the content region: save now instead of the browser's "Save page".
    let on_key_down = move |ev: web_sys::KeyboardEvent| {
        let modifier = ev.ctrl_key() || ev.meta_key();
        let key = ev.key();
        if ctrl.with_value(|c| c.on_key_down(modifier, &key)) {
            ev.prevent_default();
        }
    };

    let on_font_family = move |ev: web_sys::Event| {
        let value = event_target_value(&ev);
        ctrl.with_value(|c| {
            c.apply_inline_style(InlineStyle::new(StyleProperty::FontFamily, value))
        });
    };

    let on_font_size = move |ev: web_sys::Event| {
        let value = event_target_value(&ev);
        ctrl.with_value(|c| c.apply_inline_style(InlineStyle::new(StyleProperty::FontSize, value)));
    };

    let on_privacy_change = move |ev: web_sys::Event| {
        let desired = event_target_checked(&ev);
        let c = ctrl.get_value();
        spawn_local(async move {
            let _ = c.toggle_privacy(desired).await;
        });
    };

    let on_copy = move |_| {
        let c = ctrl.get_value();
        spawn_local(async move {
            let _ = c.copy_url().await;
        });
    };

    let on_set_password = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let password = new_password.get_untracked();
        let c = ctrl.get_value();
        spawn_local(async move {
            if c.set_password(&password).await.is_ok() {
                new_password.set(String::new());
            }
        });
    };

    // Keep the selection in the content region when a toolbar button is pressed.
    let keep_selection = |ev: web_sys::MouseEvent| ev.prevent_default();
    let toolbar_disabled = move || !signals.toolbar_enabled.get();
    let select_class = "h-8 rounded-md border border-input bg-transparent px-2 text-sm disabled:opacity-50";

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[880px] px-4 py-6">
                <header class="mb-3 flex items-center justify-between gap-2">
                    <a href="/" class="text-sm font-medium text-foreground">"Manuscripta"</a>

                    <div class="flex items-center gap-2">
                        <span
                            id="save-status"
                            class=move || {
                                if signals.status.get().is_error() {
                                    "text-xs text-destructive"
                                } else {
                                    "text-xs text-muted-foreground"
                                }
                            }
                        >
                            {move || signals.status.get().to_string()}
                        </span>

                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_copy>
                            <CopyIcon />
                            {move || signals.copy_feedback.get().label()}
                        </Button>

                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Icon
                            attr:title="Settings"
                            on:click=move |_| settings_open.update(|open| *open = !*open)
                        >
                            <Settings />
                        </Button>
                    </div>
                </header>

                <Show when=move || signals.password_setup_visible.get()>
                    <Card class="mb-4">
                        <CardHeader>
                            <CardTitle class="text-base">"Set a password"</CardTitle>
                            <CardDescription class="text-xs">
                                "Saving starts once the document has a password."
                            </CardDescription>
                        </CardHeader>
                        <CardContent>
                            <form class="flex flex-col gap-3" on:submit=on_set_password>
                                <div class="flex flex-col gap-1.5">
                                    <Label html_for="new-password" class="text-xs">"Password"</Label>
                                    <Input
                                        id="new-password"
                                        r#type="password"
                                        autocomplete="new-password"
                                        placeholder="At least 8 characters"
                                        bind_value=new_password
                                        disabled=signals.password_busy
                                    />
                                </div>
                                {move || signals.password_error.get().map(|e| view! { <FieldError>{e}</FieldError> })}
                                <Button attr:disabled=move || signals.password_busy.get()>
                                    <Show when=move || signals.password_busy.get()>
                                        <Spinner />
                                    </Show>
                                    "Set password"
                                </Button>
                            </form>
                        </CardContent>
                    </Card>
                </Show>

                <Show when=move || read_only>
                    <div class="mb-4 rounded-md border px-4 py-3">
                        <Show
                            when=move || unlock_open.get()
                            fallback=move || view! {
                                <div class="flex items-center justify-between gap-2 text-xs text-muted-foreground">
                                    "This document is read-only."
                                    <Button
                                        variant=ButtonVariant::Outline
                                        size=ButtonSize::Sm
                                        on:click=move |_| unlock_open.set(true)
                                    >
                                        "Unlock editing"
                                    </Button>
                                </div>
                            }
                        >
                            <UnlockForm
                                ctrl
                                signals
                                on_cancel=Callback::new(move |_| {
                                    unlock_open.set(false);
                                    signals.unlock_error.set(None);
                                })
                            />
                        </Show>
                    </div>
                </Show>

                <div
                    class=move || {
                        if signals.toolbar_enabled.get() {
                            "mb-2 flex flex-wrap items-center gap-2"
                        } else {
                            "hidden"
                        }
                    }
                    role="toolbar"
                >
                    <select class=select_class prop:disabled=toolbar_disabled on:change=on_font_family>
                        {FONT_FAMILIES
                            .iter()
                            .map(|(value, label)| view! { <option value=*value>{*label}</option> })
                            .collect_view()}
                    </select>
                    <select class=select_class prop:disabled=toolbar_disabled on:change=on_font_size>
                        {FONT_SIZES
                            .iter()
                            .map(|(value, label)| view! { <option value=*value>{*label}</option> })
                            .collect_view()}
                    </select>
                    <Button
                        variant=ButtonVariant::Toolbar
                        size=ButtonSize::Icon
                        attr:title="Bold"
                        attr:disabled=toolbar_disabled
                        on:mousedown=keep_selection
                        on:click=move |_| {
                            ctrl.with_value(|c| c.apply_command(FormatCommand::Bold));
                        }
                    >
                        <Bold />
                    </Button>
                    <Button
                        variant=ButtonVariant::Toolbar
                        size=ButtonSize::Icon
                        attr:title="Italic"
                        attr:disabled=toolbar_disabled
                        on:mousedown=keep_selection
                        on:click=move |_| {
                            ctrl.with_value(|c| c.apply_command(FormatCommand::Italic));
                        }
                    >
                        <Italic />
                    </Button>
                </div>

                <div
                    id="editor-content"
                    node_ref=signals.content_ref
                    class="min-h-[60vh] rounded-md border px-6 py-4 leading-relaxed outline-none focus-visible:ring-2 focus-visible:ring-ring/50"
                    contenteditable=move || if signals.editable.get() { "true" } else { "false" }
                    on:input=move |_| ctrl.with_value(|c| c.on_content_changed())
                    on:keydown=on_key_down
                ></div>

                <Show when=move || settings_open.get()>
                    <aside class="fixed right-4 top-16 z-50 w-80 rounded-xl border bg-card p-4 shadow-lg">
                        <div class="mb-3 flex items-center justify-between">
                            <h2 class="text-sm font-semibold">"Settings"</h2>
                            <Button
                                variant=ButtonVariant::Ghost
                                size=ButtonSize::Icon
                                attr:title="Close"
                                on:click=move |_| settings_open.set(false)
                            >
                                <X />
                            </Button>
                        </div>

                        <div class="flex flex-col gap-2">
                            <label class="flex items-center gap-2 text-sm">
                                <input
                                    id="privacy-toggle"
                                    type="checkbox"
                                    prop:checked=move || signals.privacy_checked.get()
                                    prop:disabled=move || !signals.privacy_enabled.get()
                                    on:change=on_privacy_change
                                />
                                "Private (password required to read)"
                            </label>
                            {move || signals.privacy_error.get().map(|e| view! { <FieldError>{e}</FieldError> })}

                            <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=on_copy>
                                <CopyIcon />
                                {move || signals.copy_feedback.get().label()}
                            </Button>
                        </div>
                    </aside>
                </Show>
            </div>
        </div>
    }
}
