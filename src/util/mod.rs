/// Browser-local wall-clock time, e.g. `10:42:07 AM`.
pub(crate) fn local_time_label() -> String {
    let d = js_sys::Date::new_0();
    d.to_locale_time_string("default").into()
}

pub(crate) fn editor_path(doc_id: &str) -> String {
    format!("/write/{}", urlencoding::encode(doc_id))
}
