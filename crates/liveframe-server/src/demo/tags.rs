//! Tag selector component.
//!
//! The same component appears twice on the `/tags` page. Each instance owns
//! a [`Namespace`], so its messages (`names_SELECT_TAG`, `teams_SELECT_TAG`)
//! reach only that instance.

use liveframe_core::{Message, MessageMap, Namespace, Response};
use liveframe_proto::js;
use serde::Deserialize;

use super::DemoModel;
use crate::html::{button, escape};

/// Select the string argument.
pub const SELECT_TAG: &str = "SELECT_TAG";
/// Deselect the string argument.
pub const REMOVE_TAG: &str = "REMOVE_TAG";
/// Add a new tag from the instance's form.
pub const ADD_TAG: &str = "ADD_TAG";

/// One tag selector instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSelector {
    namespace: Namespace,
    title: String,
    /// Tags that can be picked
    pub available: Vec<String>,
    /// Tags picked, in pick order
    pub selected: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct NewTag {
    tag: String,
}

impl TagSelector {
    /// Instance with namespace `id`.
    pub fn new(id: &str, title: &str, available: &[&str]) -> Self {
        Self {
            namespace: Namespace::new(id),
            title: title.to_string(),
            available: available.iter().map(|tag| (*tag).to_string()).collect(),
            selected: Vec::new(),
        }
    }

    /// Instance namespace.
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    fn select(&mut self, tag: String) -> Response {
        if !self.available.contains(&tag) {
            return Response::error(liveframe_core::HandlerError::msg(format!("unknown tag {tag}")));
        }
        if !self.selected.contains(&tag) {
            self.selected.push(tag);
        }
        Response::ok()
    }

    fn remove(&mut self, tag: &str) {
        self.selected.retain(|selected| selected != tag);
    }

    fn add(&mut self, tag: &str) {
        let tag = tag.trim();
        if !tag.is_empty() && !self.available.iter().any(|known| known == tag) {
            self.available.push(tag.to_string());
        }
    }

    fn render(&self) -> String {
        let ns = &self.namespace;
        let form_id = ns.qualify("form");
        let mut out = format!("<section id=\"{}\"><h3>{}</h3><div>", escape(ns.id()), escape(&self.title));
        for tag in &self.available {
            if self.selected.contains(tag) {
                out.push_str(&button(&js::send_message(&ns.qualify(REMOVE_TAG), tag), &format!("✓ {tag}")));
            } else {
                out.push_str(&button(&js::send_message(&ns.qualify(SELECT_TAG), tag), tag));
            }
        }
        out.push_str(&format!(
            "</div><form id=\"{form}\" onsubmit=\"return false\"><input name=\"tag\" placeholder=\"New tag\">{add}</form></section>",
            form = escape(&form_id),
            add = button(&js::submit_form(&ns.qualify(ADD_TAG), &form_id), "Add"),
        ));
        out
    }
}

pub(crate) fn demo_selectors() -> Vec<TagSelector> {
    vec![
        TagSelector::new("names", "Pick some names", &["Jon", "Allan", "Piotr"]),
        TagSelector::new("teams", "Pick some teams", &["Arsenal", "Man City", "Real Madrid"]),
    ]
}

fn selector<'a>(model: &'a mut DemoModel, id: &str) -> Option<&'a mut TagSelector> {
    model.selectors.iter_mut().find(|selector| selector.namespace.id() == id)
}

fn component(id: &str) -> MessageMap<DemoModel> {
    let select_id = id.to_string();
    let remove_id = id.to_string();
    let add_id = id.to_string();

    MessageMap::new()
        .with(SELECT_TAG, move |message: &Message, model: &mut DemoModel| {
            let tag = match message.args.decode_string() {
                Ok(tag) => tag,
                Err(err) => return Response::error(err),
            };
            selector(model, &select_id).map_or_else(Response::ok, |selector| selector.select(tag))
        })
        .with(REMOVE_TAG, move |message: &Message, model: &mut DemoModel| {
            match message.args.decode_string() {
                Ok(tag) => {
                    if let Some(selector) = selector(model, &remove_id) {
                        selector.remove(&tag);
                    }
                    Response::ok()
                },
                Err(err) => Response::error(err),
            }
        })
        .with(ADD_TAG, move |message: &Message, model: &mut DemoModel| {
            match message.args.decode_struct::<NewTag>() {
                Ok(NewTag { tag }) => {
                    if let Some(selector) = selector(model, &add_id) {
                        selector.add(&tag);
                    }
                    Response::ok()
                },
                Err(err) => Response::error(err),
            }
        })
}

pub(crate) fn messages(selectors: &[TagSelector]) -> MessageMap<DemoModel> {
    MessageMap::merge_all(
        selectors
            .iter()
            .map(|selector| selector.namespace.qualify_map(component(selector.namespace.id()))),
    )
}

pub(crate) fn render(selectors: &[TagSelector]) -> String {
    selectors.iter().map(TagSelector::render).collect()
}
