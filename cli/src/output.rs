//! Rendering of build results for the terminal

use anyhow::{Context, Result};
use clap::ValueEnum;
use sca_assembly::assembly::{EndpointStatus, ResolvedComponent, ResolvedEndpoint};
use sca_assembly::model::{Binding, QName};
use sca_assembly::{Problem, ResolvedComposite};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Indented tree of components, services and references
    #[default]
    Text,
    /// The resolved composite and its problems as one JSON document
    Json,
}

#[derive(Serialize)]
struct Report<'a> {
    composite: &'a ResolvedComposite,
    problems: &'a [Problem],
}

pub fn render(
    format: OutputFormat,
    resolved: &ResolvedComposite,
    problems: &[Problem],
) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(resolved)),
        OutputFormat::Json => render_json(resolved, problems),
    }
}

pub fn render_json(resolved: &ResolvedComposite, problems: &[Problem]) -> Result<String> {
    serde_json::to_string_pretty(&Report {
        composite: resolved,
        problems,
    })
    .context("Failed to serialize resolved composite")
}

pub fn render_text(resolved: &ResolvedComposite) -> String {
    let mut tree = Tree::default();
    tree.composite(resolved);
    tree.out
}

/// One line per problem, `warning: Id at path (params)`
pub fn render_problems(problems: &[Problem]) -> String {
    problems.iter().map(|p| format!("{}\n", p)).collect()
}

#[derive(Default)]
struct Tree {
    out: String,
    depth: usize,
}

impl Tree {
    fn line(&mut self, text: impl AsRef<str>) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self)) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    fn composite(&mut self, composite: &ResolvedComposite) {
        self.line(format!("composite {}", composite.name));
        self.nested(|tree| {
            for component in &composite.components {
                tree.component(component);
            }
            for service in &composite.services {
                tree.line(format!(
                    "promotes service {} -> {}",
                    service.name,
                    service.promoted.as_deref().unwrap_or("?")
                ));
                tree.nested(|tree| {
                    tree.policies(&service.intents, &service.policy_sets);
                    tree.bindings(&service.bindings);
                });
            }
            for reference in &composite.references {
                tree.line(format!(
                    "promotes reference {} -> {}",
                    reference.name,
                    reference.promoted.join(", ")
                ));
                tree.nested(|tree| {
                    tree.policies(&reference.intents, &reference.policy_sets);
                    tree.bindings(&reference.bindings);
                });
            }
        });
    }

    fn component(&mut self, component: &ResolvedComponent) {
        self.line(format!(
            "component {} ({}) uri={}",
            component.name,
            component.implementation,
            component.uri.as_deref().unwrap_or("-")
        ));
        self.nested(|tree| {
            for service in &component.services {
                let callback = if service.callback { " callback" } else { "" };
                tree.line(format!(
                    "service {}{}{}",
                    service.name,
                    interface(service.interface.as_deref()),
                    callback
                ));
                tree.nested(|tree| {
                    tree.policies(&service.intents, &service.policy_sets);
                    tree.bindings(&service.bindings);
                });
            }
            for reference in &component.references {
                let callback = if reference.callback { " callback" } else { "" };
                tree.line(format!(
                    "reference {} {}{}{}",
                    reference.name,
                    reference.multiplicity,
                    interface(reference.interface.as_deref()),
                    callback
                ));
                tree.nested(|tree| {
                    tree.policies(&reference.intents, &reference.policy_sets);
                    tree.bindings(&reference.bindings);
                    for endpoint in &reference.endpoints {
                        tree.line(endpoint_line(endpoint));
                    }
                });
            }
            if let Some(composite) = &component.composite {
                tree.composite(composite);
            }
        });
    }

    fn bindings(&mut self, bindings: &[Binding]) {
        for binding in bindings {
            self.line(format!(
                "{} {} {}",
                binding.binding_type,
                binding.name.as_deref().unwrap_or("-"),
                binding.uri.as_deref().unwrap_or("-")
            ));
        }
    }

    fn policies(&mut self, intents: &[QName], policy_sets: &[QName]) {
        if !intents.is_empty() {
            self.line(format!("intents {}", join(intents)));
        }
        if !policy_sets.is_empty() {
            self.line(format!("policy sets {}", join(policy_sets)));
        }
    }
}

fn interface(name: Option<&str>) -> String {
    name.map(|n| format!(" [{}]", n)).unwrap_or_default()
}

fn join(names: &[QName]) -> String {
    names
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn endpoint_line(endpoint: &ResolvedEndpoint) -> String {
    let status = match endpoint.status {
        EndpointStatus::Resolved => "resolved",
        EndpointStatus::Unresolved => "unresolved",
        EndpointStatus::External => "external",
    };
    match &endpoint.binding {
        Some(binding) => format!(
            "-> {} {} via {}",
            status, endpoint.target, binding.binding_type
        ),
        None => format!("-> {} {}", status, endpoint.target),
    }
}
