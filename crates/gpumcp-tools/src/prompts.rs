//! Prompt library: parameterised workflow templates.
//!
//! Rendering is intentionally not the usual "replace known placeholders,
//! error on the rest" template engine. The precise law:
//!
//! 1. For every caller-supplied `(key, value)`, replace every literal
//! `{{key}}` occurrence with `value` — even if `key` isn't declared as
//! an argument.
//! 2. Then, for every declared argument whose placeholder still appears
//! unreplaced, substitute its default (possibly empty).
//! 3. Placeholders whose name is not declared are left untouched.
//! 4. Trim leading and trailing whitespace from the final text.
//!
//! Step 1 running before step 2 is what makes idempotence hold: once a caller value has landed, re-rendering with the same
//! `args` can't touch it again because the placeholder text is gone.

use std::collections::HashMap;

use gpumcp_protocol::types::{Prompt, PromptArgument};

/// One argument a prompt template accepts.
#[derive(Debug, Clone)]
pub struct PromptArgSpec {
    /// Argument name, referenced in the template as `{{name}}`.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Whether the caller must supply this argument.
    pub required: bool,
    /// Default substituted when the caller omits this argument.
    pub default: &'static str,
}

/// A named, parameterised message template.
#[derive(Debug, Clone)]
pub struct PromptDefinition {
    /// Unique stable name.
    pub name: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Ordered argument list.
    pub arguments: Vec<PromptArgSpec>,
    /// Body template containing `{{name}}` placeholders.
    pub template: &'static str,
}

/// Raised when rendering fails before substitution even starts.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PromptError {
    /// A required argument was missing from the caller's payload.
    #[error("missing required argument: {0}")]
    MissingRequired(String),
}

impl PromptDefinition {
    /// Render as the wire `Prompt` type for `prompts/list`.
    #[must_use]
    pub fn to_wire(&self) -> Prompt {
        Prompt {
            name: self.name.to_string(),
            description: Some(self.description.to_string()),
            arguments: Some(
                self.arguments
                    .iter()
                    .map(|a| PromptArgument {
                        name: a.name.to_string(),
                        description: Some(a.description.to_string()),
                        required: Some(a.required),
                    })
                    .collect(),
            ),
        }
    }

    /// Validate that every required argument is present.
    pub fn validate(&self, caller_args: &HashMap<String, String>) -> Result<(), PromptError> {
        for arg in &self.arguments {
            if arg.required && !caller_args.contains_key(arg.name) {
                return Err(PromptError::MissingRequired(arg.name.to_string()));
            }
        }
        Ok(())
    }

    /// Render the template per the rendering law above. Callers must run
    /// [`PromptDefinition::validate`] first; this function does not itself
    /// reject missing required arguments.
    #[must_use]
    pub fn render(&self, caller_args: &HashMap<String, String>) -> String {
        let mut text = self.template.to_string();

        for (key, value) in caller_args {
            let placeholder = format!("{{{{{key}}}}}");
            text = text.replace(&placeholder, value);
        }

        for arg in &self.arguments {
            let placeholder = format!("{{{{{}}}}}", arg.name);
            if text.contains(&placeholder) {
                text = text.replace(&placeholder, arg.default);
            }
        }

        text.trim().to_string()
    }
}

/// The three prompts that are part of this service's contract:
/// `gpu-health-check`, `diagnose-xid-errors`, `gpu-triage`.
#[must_use]
pub fn library() -> crate::registry::PromptRegistry {
    let mut registry = crate::registry::PromptRegistry::new();

    registry.register(PromptDefinition {
        name: "gpu-health-check",
        description: "Run a standard GPU health sweep, optionally scoped to one node.",
        arguments: vec![PromptArgSpec {
            name: "node",
            description: "Node name to scope the check to, or all nodes if omitted.",
            required: false,
            default: "all nodes",
        }],
        template: "Check GPU health on {{node}}. Call get_gpu_health, then get_gpu_inventory, \
            and summarise any device reporting warning, degraded, or critical status.",
    });

    registry.register(PromptDefinition {
        name: "diagnose-xid-errors",
        description: "Pull and interpret recent NVRM Xid errors from the kernel log.",
        arguments: vec![PromptArgSpec {
            name: "time_range",
            description: "How far back to look, e.g. '1h', '30m'.",
            required: false,
            default: "1h",
        }],
        template: "Call analyze_xid_errors covering the last {{time_range}}. For each Xid \
            event returned, report its severity, the affected GPU, and the suggested \
            SRE action from the code table.",
    });

    registry.register(PromptDefinition {
        name: "gpu-triage",
        description: "Full triage workflow for a GPU incident: inventory, health, and Xid correlation.",
        arguments: vec![
            PromptArgSpec {
                name: "node",
                description: "Node to focus triage on.",
                required: false,
                default: "cluster-wide",
            },
            PromptArgSpec {
                name: "incident_id",
                description: "Tracking id for the incident this triage is attached to.",
                required: false,
                default: "",
            },
        ],
        template: "# GPU Triage{{incident_id}}\n\
            Scope: {{node}}\n\
            1. get_gpu_inventory for the scope above.\n\
            2. get_gpu_health for any node reporting non-ready status.\n\
            3. analyze_xid_errors for any node with a health warning.\n\
            Summarise findings against incident {{incident_id}}.",
    });

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PromptDefinition {
        PromptDefinition {
            name: "sample",
            description: "test fixture",
            arguments: vec![
                PromptArgSpec { name: "known", description: "", required: false, default: "fallback" },
                PromptArgSpec { name: "must", description: "", required: true, default: "" },
            ],
            template: "known={{known}} must={{must}} unknown={{unknown}}",
        }
    }

    #[test]
    fn unknown_placeholder_passes_through_verbatim() {
        let prompt = sample();
        let args = HashMap::from([("must".to_string(), "x".to_string())]);
        let rendered = prompt.render(&args);
        assert!(rendered.contains("unknown={{unknown}}"));
    }

    #[test]
    fn caller_value_wins_over_default() {
        let prompt = sample();
        let args = HashMap::from([
            ("known".to_string(), "caller".to_string()),
            ("must".to_string(), "x".to_string()),
        ]);
        assert_eq!(prompt.render(&args), "known=caller must=x unknown={{unknown}}");
    }

    #[test]
    fn missing_arg_falls_back_to_default() {
        let prompt = sample();
        let args = HashMap::from([("must".to_string(), "x".to_string())]);
        let rendered = prompt.render(&args);
        assert!(rendered.contains("known=fallback"));
    }

    #[test]
    fn validate_rejects_missing_required_argument() {
        let prompt = sample();
        let err = prompt.validate(&HashMap::new()).unwrap_err();
        assert_eq!(err, PromptError::MissingRequired("must".to_string()));
    }

    #[test]
    fn rendering_is_idempotent_once_no_known_placeholders_remain() {
        let prompt = sample();
        let args = HashMap::from([
            ("known".to_string(), "caller".to_string()),
            ("must".to_string(), "x".to_string()),
        ]);
        let once = prompt.render(&args);
        // Re-running render on a definition whose template is now the
        // already-rendered text (simulating "render(render(p,a),a)")
        // changes nothing further because the known/must placeholders
        // are already gone; only the still-unknown placeholder remains,
        // and it is never substituted.
        let reparsed = PromptDefinition { template: Box::leak(once.clone().into_boxed_str()),..prompt };
        let twice = reparsed.render(&args);
        assert_eq!(once, twice);
    }

    #[test]
    fn gpu_triage_default_node_is_cluster_wide() {
        let registry = library();
        let prompt = registry.get("gpu-triage").unwrap();
        let rendered = prompt.render(&HashMap::new());
        assert!(rendered.contains("Scope: cluster-wide"));
    }

    #[test]
    fn gpu_triage_with_both_args_contains_both_literals() {
        let registry = library();
        let prompt = registry.get("gpu-triage").unwrap();
        let args = HashMap::from([
            ("incident_id".to_string(), "INC-1".to_string()),
            ("node".to_string(), "n1".to_string()),
        ]);
        let rendered = prompt.render(&args);
        assert!(rendered.contains("INC-1"));
        assert!(rendered.contains("Scope: n1"));
    }
}

#[cfg(test)]
mod rendering_law_properties {
    use super::*;
    use proptest::prelude::*;

    fn arg_value() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{0,12}"
    }

    fn definition() -> PromptDefinition {
        PromptDefinition {
            name: "sample",
            description: "test fixture",
            arguments: vec![
                PromptArgSpec { name: "known", description: "", required: false, default: "fallback" },
                PromptArgSpec { name: "must", description: "", required: false, default: "default-must" },
            ],
            template: "known={{known}} must={{must}} unknown={{unknown}}",
        }
    }

    proptest! {
        /// Re-rendering the already-rendered output with the same caller
        /// args is a no-op: step 1 already erased every placeholder a
        /// caller value could match, so nothing is left for it to touch.
        #[test]
        fn render_is_idempotent_for_arbitrary_caller_args(known in arg_value(), must in arg_value()) {
            let prompt = definition();
            let args = HashMap::from([
                ("known".to_string(), known),
                ("must".to_string(), must),
            ]);
            let once = prompt.render(&args);
            let reparsed = PromptDefinition { template: Box::leak(once.clone().into_boxed_str()),..prompt };
            let twice = reparsed.render(&args);
            prop_assert_eq!(once, twice);
        }

        /// A placeholder not declared as an argument is never substituted,
        /// regardless of what the caller passes for the declared ones.
        #[test]
        fn undeclared_placeholder_always_survives(known in arg_value(), must in arg_value()) {
            let prompt = definition();
            let args = HashMap::from([
                ("known".to_string(), known),
                ("must".to_string(), must),
            ]);
            let rendered = prompt.render(&args);
            prop_assert!(rendered.contains("unknown={{unknown}}"));
        }

        /// Step 1 runs before step 2: whatever the caller supplies always
        /// lands in the output, even when it differs from the declared
        /// default.
        #[test]
        fn caller_value_always_wins_over_declared_default(known in arg_value()) {
            let prompt = definition();
            let args = HashMap::from([("known".to_string(), known.clone())]);
            let rendered = prompt.render(&args);
            prop_assert!(rendered.contains(&format!("known={known}")));
        }
    }
}
