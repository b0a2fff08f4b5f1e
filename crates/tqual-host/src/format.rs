//! Source-like rendering of host types, using simple class names.

use crate::{Type, TypeEnv, WildcardBound};
use std::fmt::Write;

pub fn format_type(env: &dyn TypeEnv, ty: &Type) -> String {
    let mut out = String::new();
    write_type(env, ty, &mut out);
    out
}

fn write_list(env: &dyn TypeEnv, types: &[Type], sep: &str, out: &mut String) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_type(env, ty, out);
    }
}

fn write_type(env: &dyn TypeEnv, ty: &Type, out: &mut String) {
    match ty {
        Type::Annotated(names, inner) => {
            for name in names {
                let _ = write!(out, "@{name} ");
            }
            write_type(env, inner, out);
        }
        Type::Class(ct) => {
            if let Some(enclosing) = &ct.enclosing {
                write_type(env, enclosing, out);
                out.push('.');
            }
            match env.class(ct.def) {
                Some(def) => out.push_str(def.simple_name()),
                None => {
                    let _ = write!(out, "<class#{}>", ct.def.0);
                }
            }
            if !ct.args.is_empty() {
                out.push('<');
                write_list(env, &ct.args, ", ", out);
                out.push('>');
            }
        }
        Type::Array(component) => {
            write_type(env, component, out);
            out.push_str("[]");
        }
        Type::TypeVar(id) => match env.type_param(*id) {
            Some(tp) => out.push_str(&tp.name),
            None => {
                let _ = write!(out, "<tv#{}>", id.0);
            }
        },
        Type::Wildcard(bound) => {
            out.push('?');
            match bound {
                WildcardBound::Unbounded => {}
                WildcardBound::Extends(b) => {
                    out.push_str(" extends ");
                    write_type(env, b, out);
                }
                WildcardBound::Super(b) => {
                    out.push_str(" super ");
                    write_type(env, b, out);
                }
            }
        }
        Type::Primitive(p) => out.push_str(p.keyword()),
        Type::Null => out.push_str("null"),
        Type::Void => out.push_str("void"),
        Type::Intersection(parts) => write_list(env, parts, " & ", out),
        Type::Union(alts) => write_list(env, alts, " | ", out),
        Type::Executable(m) => {
            write_type(env, &m.return_type, out);
            let _ = write!(out, " {}(", m.name);
            write_list(env, &m.params, ", ", out);
            out.push(')');
        }
    }
}
