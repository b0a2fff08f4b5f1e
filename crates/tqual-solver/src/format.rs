//! Rendering annotated types as text.
//!
//! Only computed structure is printed. A declared type whose arguments have
//! not been computed yet prints the host arguments instead; nothing here
//! triggers initialization.

use crate::annotations::AnnotationSet;
use crate::atm::{AtmData, AtmId, AtmKind, Lazy};
use crate::factory::AnnotatedTypeFactory;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::visitor::AtmVisitor;
use rustc_hash::FxHashSet;
use tqual_host::{Type, format_type};

/// Pluggable renderer used by the factory for diagnostics.
pub trait AtmFormatter {
    fn format(&self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String;

    /// Rendering with every optional detail switched on.
    fn format_verbose(&self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        self.format(factory, id)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DefaultAtmFormatter {
    /// Print `/*DECL*/` markers on declarations.
    pub print_invisible: bool,
    /// Print bracketed bounds, including null lower bounds.
    pub print_verbose_generics: bool,
}

impl DefaultAtmFormatter {
    pub fn new(print_invisible: bool, print_verbose_generics: bool) -> Self {
        Self {
            print_invisible,
            print_verbose_generics,
        }
    }
}

impl AtmFormatter for DefaultAtmFormatter {
    fn format(&self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        FormattingVisitor::new(*self).visit(factory, id)
    }

    fn format_verbose(&self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        FormattingVisitor::new(DefaultAtmFormatter::new(true, true)).visit(factory, id)
    }
}

struct FormattingVisitor {
    options: DefaultAtmFormatter,
    visiting: FxHashSet<AtmId>,
    depth: DepthCounter,
}

impl FormattingVisitor {
    fn new(options: DefaultAtmFormatter) -> Self {
        Self {
            options,
            visiting: FxHashSet::default(),
            depth: DepthCounter::with_profile(RecursionProfile::Formatting),
        }
    }

    fn nested(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        if !self.depth.enter() {
            return "...".to_owned();
        }
        let out = self.visit(factory, id);
        self.depth.leave();
        out
    }

    fn annotations(&self, factory: &AnnotatedTypeFactory<'_>, set: &AnnotationSet) -> String {
        let mut out = String::new();
        for q in set {
            out.push('@');
            out.push_str(factory.hierarchy().name(q));
            out.push(' ');
        }
        out
    }

    fn host(&self, factory: &AnnotatedTypeFactory<'_>, ty: &Type) -> String {
        format_type(factory.env(), ty)
    }

    fn join(
        &mut self,
        factory: &AnnotatedTypeFactory<'_>,
        ids: &[AtmId],
        separator: &str,
    ) -> String {
        ids.iter()
            .map(|id| self.nested(factory, *id))
            .collect::<Vec<_>>()
            .join(separator)
    }

    fn print_bound(
        &mut self,
        factory: &AnnotatedTypeFactory<'_>,
        keyword: &str,
        bound: Option<AtmId>,
        out: &mut String,
    ) {
        let is_null = bound.is_some_and(|b| factory.kind(b) == AtmKind::Null);
        if !self.options.print_verbose_generics && (bound.is_none() || is_null) {
            return;
        }
        out.push(' ');
        out.push_str(keyword);
        out.push(' ');
        match bound {
            None => out.push_str("<null>"),
            Some(b) if is_null => {
                out.push_str(&self.annotations(factory, factory.annotations(b)));
                out.push_str("Void");
            }
            Some(b) => out.push_str(&self.nested(factory, b)),
        }
    }

    /// ` extends .. super ..` for a type variable or wildcard, once per cycle.
    fn print_bounds(
        &mut self,
        factory: &AnnotatedTypeFactory<'_>,
        id: AtmId,
        upper: Option<AtmId>,
        lower: Option<AtmId>,
        out: &mut String,
    ) {
        if !self.visiting.insert(id) {
            return;
        }
        if self.options.print_verbose_generics {
            out.push('[');
        }
        self.print_bound(factory, "extends", upper, out);
        self.print_bound(factory, "super", lower, out);
        if self.options.print_verbose_generics {
            out.push(']');
        }
        self.visiting.remove(&id);
    }
}

impl AtmVisitor for FormattingVisitor {
    type Output = String;

    fn visit_declared(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        let AtmData::Declared {
            class,
            args,
            enclosing,
        } = &node.data
        else {
            return self.host(factory, &node.underlying);
        };
        let mut out = String::new();
        if node.is_declaration() && self.options.print_invisible {
            out.push_str("/*DECL*/ ");
        }
        if let Some(Some(outer)) = enclosing.get() {
            out.push_str(&self.nested(factory, *outer));
            out.push('.');
        }
        out.push_str(&self.annotations(factory, &node.annotations));
        match factory.env().class(*class) {
            Some(def) => out.push_str(def.simple_name()),
            None => out.push_str(&self.host(factory, &node.underlying)),
        }
        match args {
            Lazy::Computed(args) if !args.is_empty() => {
                out.push('<');
                out.push_str(&self.join(factory, args, ", "));
                out.push('>');
            }
            Lazy::Computed(_) => {}
            Lazy::Uncomputed => {
                let written = node
                    .underlying
                    .as_class()
                    .map(|ct| ct.args.as_slice())
                    .unwrap_or_default();
                if !written.is_empty() {
                    let rendered: Vec<String> =
                        written.iter().map(|a| self.host(factory, a)).collect();
                    out.push('<');
                    out.push_str(&rendered.join(", "));
                    out.push('>');
                }
            }
        }
        out
    }

    fn visit_executable(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        let AtmData::Executable {
            type_vars: Lazy::Computed(type_vars),
            params: Lazy::Computed(params),
            return_type: Lazy::Computed(return_type),
            receiver: Lazy::Computed(receiver),
            thrown: Lazy::Computed(thrown),
        } = &node.data
        else {
            return self.host(factory, &node.underlying);
        };
        let name = match &node.underlying {
            Type::Executable(m) => m.name.clone(),
            _ => "METHOD".to_owned(),
        };

        let mut out = String::new();
        if !type_vars.is_empty() {
            out.push('<');
            out.push_str(&self.join(factory, type_vars, ", "));
            out.push_str("> ");
        }
        out.push_str(&self.nested(factory, *return_type));
        out.push(' ');
        out.push_str(&name);
        out.push('(');
        if let Some(receiver) = receiver {
            out.push_str(&self.nested(factory, *receiver));
            out.push_str(" this");
        }
        for (i, param) in params.iter().enumerate() {
            if receiver.is_some() || i > 0 {
                out.push_str(", ");
            }
            out.push_str(&self.nested(factory, *param));
            out.push_str(&format!(" p{i}"));
        }
        out.push(')');
        if !thrown.is_empty() {
            out.push_str(" throws ");
            out.push_str(&self.join(factory, thrown, ", "));
        }
        out
    }

    fn visit_array(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let mut suffix = String::new();
        let mut current = id;
        loop {
            let node = factory.node(current);
            if !node.annotations.is_empty() {
                suffix.push(' ');
                suffix.push_str(&self.annotations(factory, &node.annotations));
            }
            suffix.push_str("[]");
            match &node.data {
                AtmData::Array {
                    component: Lazy::Computed(component),
                } if factory.kind(*component) == AtmKind::Array => current = *component,
                AtmData::Array {
                    component: Lazy::Computed(component),
                } => return self.nested(factory, *component) + &suffix,
                _ => {
                    let element = match &node.underlying {
                        Type::Array(element) => self.host(factory, element),
                        other => self.host(factory, other),
                    };
                    return element + &suffix;
                }
            }
        }
    }

    fn visit_type_variable(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        let AtmData::TypeVariable { var, upper, lower } = &node.data else {
            return self.host(factory, &node.underlying);
        };
        let mut out = match factory.env().type_param(*var) {
            Some(def) => def.name.clone(),
            None => self.host(factory, &node.underlying),
        };
        if node.is_declaration() && self.options.print_invisible && !self.visiting.contains(&id) {
            out.push_str("/*DECL*/ ");
        }
        let (upper, lower) = (upper.get().copied(), lower.get().copied());
        self.print_bounds(factory, id, upper, lower, &mut out);
        out
    }

    fn visit_wildcard(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        let AtmData::Wildcard { extends, super_, .. } = &node.data else {
            return self.host(factory, &node.underlying);
        };
        let mut out = String::new();
        if node.is_uninferred() {
            out.push_str("/*INFERENCE FAILED for:*/ ");
        }
        out.push_str(&self.annotations(factory, &node.annotations));
        out.push('?');
        let (upper, lower) = (extends.get().copied(), super_.get().copied());
        self.print_bounds(factory, id, upper, lower, &mut out);
        out
    }

    fn visit_primitive(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        self.annotations(factory, &node.annotations) + &self.host(factory, &node.underlying)
    }

    fn visit_null(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        self.annotations(factory, factory.annotations(id)) + "NullType"
    }

    fn visit_no_type(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        self.visit_primitive(factory, id)
    }

    fn visit_intersection(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        match &node.data {
            AtmData::Intersection {
                bounds: Lazy::Computed(bounds),
            } => self.join(factory, bounds, " & "),
            _ => self.host(factory, &node.underlying),
        }
    }

    fn visit_union(&mut self, factory: &AnnotatedTypeFactory<'_>, id: AtmId) -> String {
        let node = factory.node(id);
        match &node.data {
            AtmData::Union {
                alternatives: Lazy::Computed(alternatives),
            } => self.join(factory, alternatives, " | "),
            _ => self.host(factory, &node.underlying),
        }
    }
}

impl<'env> AnnotatedTypeFactory<'env> {
    /// Render `id` with the session's formatter.
    pub fn format(&self, id: AtmId) -> String {
        self.formatter.format(self, id)
    }

    pub fn format_verbose(&self, id: AtmId) -> String {
        self.formatter.format_verbose(self, id)
    }

    /// Replace the formatter used for [`format`](Self::format) and in
    /// error messages.
    pub fn set_formatter(&mut self, formatter: impl AtmFormatter + 'env) {
        self.formatter = Box::new(formatter);
    }
}

#[cfg(test)]
#[path = "../tests/format_tests.rs"]
mod tests;
