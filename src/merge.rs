//! Merge-field substitution. A template refers to fields as `{{fieldName}}`
//! (inner whitespace allowed); [`Resolver::resolve`] replaces each reference
//! with the field's value from a [`MergeContext`]. Values may themselves
//! contain references, so substitution repeats until no known field remains,
//! up to [`DEFAULT_MAX_DEPTH`] passes.
//!
//! A field whose value leads back to itself is rejected before any
//! substitution, and the output of every pass is held under
//! [`DEFAULT_MAX_LEN`] bytes, so a value that fans out into many references
//! fails instead of exhausting memory.
//!
//! References to unknown fields are left in the output verbatim, which makes
//! a typo in a template visible on the rendered page. No HTML escaping is
//! performed.

use regex::Regex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use tracing::warn;

/// The number of substitution passes allowed before giving up.
pub const DEFAULT_MAX_DEPTH: usize = 10;

/// The largest output, in bytes, a resolution may produce.
pub const DEFAULT_MAX_LEN: usize = 1 << 20;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.\-]+)\s*\}\}").unwrap());

/// Field values available to templates. Flat: values are plain strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct MergeContext(HashMap<String, String>);

impl MergeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MergeContext {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        MergeContext(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A reference to a field that isn't in the context. Not an error: the
/// reference is kept in the output as written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnresolvedToken {
    /// The referenced field name.
    pub field: String,

    /// The reference as it appears in the output (e.g., `{{ name }}`).
    pub token: String,
}

/// The output of [`Resolver::resolve_with_report`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    pub text: String,

    /// Unknown references left in `text`, in order of appearance.
    pub unresolved: Vec<UnresolvedToken>,

    /// The number of substitution passes that replaced something.
    pub passes: usize,
}

/// Resolves templates against a borrowed [`MergeContext`].
pub struct Resolver<'a> {
    context: &'a MergeContext,
    max_depth: usize,
    max_len: usize,
}

impl<'a> Resolver<'a> {
    /// Constructs a resolver allowing [`DEFAULT_MAX_DEPTH`] passes and
    /// [`DEFAULT_MAX_LEN`] bytes of output.
    pub fn new(context: &'a MergeContext) -> Resolver<'a> {
        Resolver {
            context,
            max_depth: DEFAULT_MAX_DEPTH,
            max_len: DEFAULT_MAX_LEN,
        }
    }

    /// Overrides the number of substitution passes allowed.
    pub fn with_max_depth(mut self, max_depth: usize) -> Resolver<'a> {
        self.max_depth = max_depth;
        self
    }

    /// Overrides the largest output allowed, in bytes.
    pub fn with_max_len(mut self, max_len: usize) -> Resolver<'a> {
        self.max_len = max_len;
        self
    }

    /// Substitutes every known field in `template`, logs a warning for each
    /// unknown one, and returns the result.
    pub fn resolve(&self, template: &str) -> Result<String> {
        let resolution = self.resolve_with_report(template)?;
        for token in &resolution.unresolved {
            warn!(field = %token.field, "unresolved merge field");
        }
        Ok(resolution.text)
    }

    /// Like [`Resolver::resolve`] but falls back to `template` unchanged when
    /// expansion fails, logging the error.
    pub fn resolve_or_raw<'t>(&self, template: &'t str) -> Cow<'t, str> {
        match self.resolve(template) {
            Ok(text) => Cow::Owned(text),
            Err(err) => {
                warn!(%err, "merge-field expansion failed; using raw text");
                Cow::Borrowed(template)
            }
        }
    }

    /// Like [`Resolver::resolve`] but returns the unknown references instead
    /// of logging them.
    pub fn resolve_with_report(&self, template: &str) -> Result<Resolution> {
        if let Some(field) = self.find_cycle(template) {
            return Err(TemplateExpansionError::Cycle {
                template: template.to_owned(),
                field: field.to_owned(),
            });
        }

        let mut text = template.to_owned();
        let mut passes = 0;
        while self.has_known_token(&text) {
            if passes == self.max_depth {
                return Err(TemplateExpansionError::TooDeep {
                    template: template.to_owned(),
                    max_depth: self.max_depth,
                });
            }
            text = self
                .substitute(&text)
                .ok_or_else(|| TemplateExpansionError::TooLong {
                    template: template.to_owned(),
                    max_len: self.max_len,
                })?;
            passes += 1;
        }

        Ok(Resolution {
            unresolved: TOKEN_RE
                .captures_iter(&text)
                .map(|caps| UnresolvedToken {
                    field: caps[1].to_owned(),
                    token: caps[0].to_owned(),
                })
                .collect(),
            text,
            passes,
        })
    }

    fn has_known_token(&self, text: &str) -> bool {
        self.known_fields(text).next().is_some()
    }

    /// The names of the known fields referenced in `text`.
    fn known_fields<'t>(&'t self, text: &'t str) -> impl Iterator<Item = &'t str> + 't {
        TOKEN_RE
            .captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(move |field| self.context.contains(field))
    }

    /// Follows references from `template` through the context and returns
    /// the first field reached again while its own value is being expanded.
    fn find_cycle<'t>(&'t self, template: &'t str) -> Option<&'t str> {
        let mut path = Vec::new();
        let mut settled = HashSet::new();
        self.known_fields(template)
            .find_map(|field| self.visit(field, &mut path, &mut settled))
    }

    fn visit<'t>(
        &'t self,
        field: &'t str,
        path: &mut Vec<&'t str>,
        settled: &mut HashSet<&'t str>,
    ) -> Option<&'t str> {
        if path.contains(&field) {
            return Some(field);
        }
        if settled.contains(field) {
            return None;
        }
        path.push(field);
        let value = self.context.get(field).unwrap_or_default();
        let cycle = self
            .known_fields(value)
            .find_map(|next| self.visit(next, path, settled));
        path.pop();
        settled.insert(field);
        cycle
    }

    /// One pass: every known reference is replaced by its value and unknown
    /// references are copied through. Returns `None` once the output grows
    /// past `max_len`.
    fn substitute(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for caps in TOKEN_RE.captures_iter(text) {
            let token = caps.get(0)?;
            out.push_str(&text[last..token.start()]);
            out.push_str(self.context.get(&caps[1]).unwrap_or(token.as_str()));
            last = token.end();
            if out.len() > self.max_len {
                return None;
            }
        }
        out.push_str(&text[last..]);
        (out.len() <= self.max_len).then_some(out)
    }
}

/// Resolves `template` against `context` with the default depth bound.
pub fn resolve(template: &str, context: &MergeContext) -> Result<String> {
    Resolver::new(context).resolve(template)
}

/// Returns true if `text` contains anything that looks like a field
/// reference, known or not.
pub fn contains_token(text: &str) -> bool {
    TOKEN_RE.is_match(text)
}

/// The result of a merge-field resolution.
pub type Result<T> = std::result::Result<T, TemplateExpansionError>;

/// Returned when a template can't be expanded within the resolver's bounds.
/// Each variant carries the template being resolved.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TemplateExpansionError {
    /// Returned when a field reached from the template refers, directly or
    /// through other fields, back to itself.
    #[error("merge field `{field}` in `{template}` refers back to itself")]
    Cycle { template: String, field: String },

    /// Returned when known references remain after the maximum number of
    /// passes.
    #[error("merge fields in `{template}` did not settle after {max_depth} passes")]
    TooDeep { template: String, max_depth: usize },

    /// Returned when a pass produces more than the maximum output length.
    #[error("expanding `{template}` produced more than {max_len} bytes")]
    TooLong { template: String, max_len: usize },
}

#[cfg(test)]
mod test {
    use super::*;

    fn context(pairs: &[(&str, &str)]) -> MergeContext {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_simple_substitution() -> Result<()> {
        let ctx = context(&[("name", "Ada")]);
        assert_eq!("Hello, Ada!", resolve("Hello, {{name}}!", &ctx)?);
        assert_eq!("Hello, Ada!", resolve("Hello, {{ name }}!", &ctx)?);
        Ok(())
    }

    #[test]
    fn test_no_tokens() -> Result<()> {
        let ctx = context(&[("name", "Ada")]);
        assert_eq!("plain text", resolve("plain text", &ctx)?);
        assert_eq!("", resolve("", &ctx)?);
        Ok(())
    }

    #[test]
    fn test_unknown_token_left_verbatim() -> Result<()> {
        let ctx = context(&[("name", "Ada")]);
        let resolution =
            Resolver::new(&ctx).resolve_with_report("{{name}} and {{ missing }}")?;
        assert_eq!("Ada and {{ missing }}", resolution.text);
        assert_eq!(
            vec![UnresolvedToken {
                field: String::from("missing"),
                token: String::from("{{ missing }}"),
            }],
            resolution.unresolved
        );
        Ok(())
    }

    #[test]
    fn test_nested_values() -> Result<()> {
        let ctx = context(&[
            ("author", "{{first}} {{last}}"),
            ("first", "Ada"),
            ("last", "{{family}}"),
            ("family", "Lovelace"),
        ]);
        let resolution = Resolver::new(&ctx).resolve_with_report("By {{author}}")?;
        assert_eq!("By Ada Lovelace", resolution.text);
        assert_eq!(3, resolution.passes);
        Ok(())
    }

    #[test]
    fn test_value_introducing_unknown_token() -> Result<()> {
        let ctx = context(&[("greeting", "Hi {{who}}")]);
        assert_eq!("Hi {{who}}", resolve("{{greeting}}", &ctx)?);
        Ok(())
    }

    #[test]
    fn test_html_untouched() -> Result<()> {
        let ctx = context(&[("link", "<a href=\"/about/\">About & more</a>")]);
        assert_eq!(
            "<p><a href=\"/about/\">About & more</a></p>",
            resolve("<p>{{link}}</p>", &ctx)?
        );
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let ctx = context(&[("a", "{{b}}!"), ("b", "bee"), ("c", "see")]);
        for template in ["{{a}} {{c}}", "{{unknown}} {{a}}", "nothing", "{{ b }}{{b}}"] {
            let once = resolve(template, &ctx)?;
            assert_eq!(once, resolve(&once, &ctx)?);
        }
        Ok(())
    }

    #[test]
    fn test_self_reference_fails() {
        let ctx = context(&[("x", "{{x}}")]);
        assert_eq!(
            Err(TemplateExpansionError::Cycle {
                template: String::from("{{x}}"),
                field: String::from("x"),
            }),
            resolve("{{x}}", &ctx)
        );
    }

    #[test]
    fn test_mutual_reference_fails() {
        let ctx = context(&[("a", "{{b}}"), ("b", "{{c}} and {{a}}"), ("c", "sea")]);
        assert_eq!(
            Err(TemplateExpansionError::Cycle {
                template: String::from("start {{a}}"),
                field: String::from("a"),
            }),
            resolve("start {{a}}", &ctx)
        );
    }

    #[test]
    fn test_unreached_cycle_is_ignored() -> Result<()> {
        let ctx = context(&[("x", "{{x}}"), ("name", "Ada"), ("greeting", "Hi {{name}}")]);
        assert_eq!("Hi Ada, Hi Ada", resolve("{{greeting}}, {{greeting}}", &ctx)?);
        Ok(())
    }

    #[test]
    fn test_fan_out_reference_fails() {
        let ctx = context(&[("x", "{{x}}".repeat(10).as_str())]);
        assert!(matches!(
            resolve("{{x}}", &ctx),
            Err(TemplateExpansionError::Cycle { .. })
        ));
    }

    #[test]
    fn test_fan_out_without_cycle_is_bounded() {
        // Ten levels of ten references each would expand to 10^10 copies.
        let mut ctx = MergeContext::new();
        for i in 0..10 {
            ctx.insert(format!("f{}", i), format!("{{{{f{}}}}}", i + 1).repeat(10));
        }
        ctx.insert("f10", "leaf");

        assert_eq!(
            Err(TemplateExpansionError::TooLong {
                template: String::from("{{f1}}"),
                max_len: DEFAULT_MAX_LEN,
            }),
            Resolver::new(&ctx).resolve("{{f1}}")
        );
    }

    #[test]
    fn test_max_len() -> Result<()> {
        let ctx = context(&[("a", "{{b}}{{b}}"), ("b", "0123456789")]);
        let resolver = Resolver::new(&ctx).with_max_len(20);
        assert_eq!("01234567890123456789", resolver.resolve("{{a}}")?);
        assert_eq!(
            Err(TemplateExpansionError::TooLong {
                template: String::from("{{a}}!"),
                max_len: 20,
            }),
            resolver.resolve("{{a}}!")
        );
        Ok(())
    }

    #[test]
    fn test_depth_bound_is_exact() {
        // Ten levels of nesting resolve in exactly ten passes.
        let mut ctx = MergeContext::new();
        for i in 0..10 {
            ctx.insert(format!("f{}", i), format!("{{{{f{}}}}}", i + 1));
        }
        ctx.insert("f10", "done");

        assert_eq!(Ok(String::from("done")), Resolver::new(&ctx).resolve("{{f1}}"));
        assert_eq!(
            Err(TemplateExpansionError::TooDeep {
                template: String::from("{{f0}}"),
                max_depth: 10,
            }),
            Resolver::new(&ctx).resolve("{{f0}}")
        );
        assert!(Resolver::new(&ctx).with_max_depth(11).resolve("{{f0}}").is_ok());
    }

    #[test]
    fn test_resolve_or_raw() {
        let ctx = context(&[("x", "{{x}}"), ("y", "why")]);
        let resolver = Resolver::new(&ctx);
        assert_eq!("{{x}} {{y}}", resolver.resolve_or_raw("{{x}} {{y}}"));
        assert_eq!("why", resolver.resolve_or_raw("{{y}}"));
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("a {{b}} c"));
        assert!(!contains_token("a {b} c"));
        assert!(!contains_token("{{ two words }}"));
    }
}
