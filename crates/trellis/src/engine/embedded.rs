//! Compiles property declarations into column bindings.

use crate::config::Embeddable;
use crate::mapping::ColumnBinding;
use crate::member::{Lens, MemberPath};
use crate::Result;

use trellis_core::schema::naming::ColumnNaming;
use trellis_core::Error;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// A nested configuration contributing bindings to its owner.
pub(crate) trait EmbedSource<E> {
    fn compile(self: Box<Self>, naming: &Arc<dyn ColumnNaming>) -> Result<Vec<ColumnBinding<E>>>;

    fn is_super_class(&self) -> bool {
        false
    }
}

pub(crate) struct Compiled<E> {
    pub(crate) bindings: Vec<ColumnBinding<E>>,

    /// Columns that must pre-exist in a supplied table.
    pub(crate) required: Vec<String>,
}

/// Compiles one level. `outer` names the columns of levels that do not carry
/// a strategy of their own.
pub(crate) fn compile<E: 'static>(
    config: Embeddable<E>,
    outer: &Arc<dyn ColumnNaming>,
) -> Result<Compiled<E>> {
    let naming = config.column_naming.clone().unwrap_or_else(|| outer.clone());

    let mut inherited = vec![];
    for super_class in config.super_classes {
        debug_assert!(super_class.is_super_class());
        inherited.extend(super_class.compile(&naming)?);
    }

    let mut local = vec![];
    let mut required = vec![];
    for declaration in config.declarations {
        let column = match declaration.column {
            Some(column) => column,
            None => naming.column_name(declaration.binding.column()),
        };
        if declaration.required {
            required.push(column.clone());
        }
        local.push(declaration.binding.with_column(column));
    }
    check_conflicts(&local)?;

    let mut nested = vec![];
    for embed in config.embeds {
        nested.extend(embed.compile(&naming)?);
    }

    // A local declaration of an inherited member replaces it.
    inherited.retain(|binding| !local.iter().any(|own| own.member() == binding.member()));

    let mut bindings = inherited;
    bindings.extend(local);
    bindings.extend(nested);
    check_conflicts(&bindings)?;

    Ok(Compiled { bindings, required })
}

/// Applies per-column overrides to bindings compiled against `V`, then lifts
/// them to `E`.
pub(crate) fn apply_overrides<E: 'static, V: 'static>(
    lens: &Lens<E, V>,
    bindings: Vec<ColumnBinding<V>>,
    overrides: &[(MemberPath, String)],
    excludes: &[MemberPath],
) -> Result<Vec<ColumnBinding<E>>> {
    for path in overrides.iter().map(|(path, _)| path).chain(excludes) {
        if !bindings.iter().any(|binding| binding.member() == Some(path)) {
            return Err(Error::invalid_mapping(format!(
                "{path} is not mapped by the embedded configuration"
            )));
        }
    }

    Ok(bindings
        .into_iter()
        .filter(|binding| !excludes.iter().any(|path| binding.member() == Some(path)))
        .map(|binding| {
            let column = overrides
                .iter()
                .find(|(path, _)| binding.member() == Some(path))
                .map(|(_, column)| column.clone());
            match column {
                Some(column) => binding.with_column(column),
                None => binding,
            }
        })
        .map(|binding| binding.lift(lens))
        .collect())
}

/// Rejects a member mapped twice and two members mapped to one column.
pub(crate) fn check_conflicts<E: 'static>(bindings: &[ColumnBinding<E>]) -> Result<()> {
    let mut members = HashSet::new();
    let mut columns: HashMap<&str, &ColumnBinding<E>> = HashMap::new();

    for binding in bindings {
        if let Some(member) = binding.member() {
            if !members.insert(member) {
                return Err(Error::invalid_mapping(format!(
                    "member {member} is already mapped"
                )));
            }
        }

        if let Some(previous) = columns.insert(binding.column(), binding) {
            return Err(Error::invalid_mapping(format!(
                "mapping already defined for column {}: {} and {}",
                binding.column(),
                describe(previous),
                describe(binding)
            )));
        }
    }
    Ok(())
}

fn describe<E: 'static>(binding: &ColumnBinding<E>) -> String {
    match binding.member() {
        Some(member) => member.to_string(),
        None => "a relation column".to_string(),
    }
}
