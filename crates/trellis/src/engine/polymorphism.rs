//! Compilation of polymorphic subtypes into per-variant table lists.

use super::embedded;
use super::entity::Hierarchy;
use super::BuildScope;
use crate::config::{PolymorphismKind, PolymorphismPolicy, SubEntity};
use crate::mapping::{ClassMappingStrategy, ColumnBinding, Discriminator};
use crate::member::{PartialLens, TypeRef};
use crate::persister::Variant;
use crate::{Entity, Result};

use trellis_core::stmt::Value;
use trellis_core::Error;

use std::collections::HashSet;
use std::sync::Arc;

type Matcher<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type Factory<E> = Arc<dyn Fn() -> E + Send + Sync>;

/// Which polymorphism layouts may be nested in one another.
///
/// | outer \ inner    | joined-tables | single-table | table-per-class |
/// |------------------|---------------|--------------|-----------------|
/// | joined-tables    | yes           | yes          | no              |
/// | single-table     | no            | no           | no              |
/// | table-per-class  | no            | no           | no              |
///
/// Nesting only goes downward from joined tables: a single-table hierarchy
/// may sit under a joined-tables one, never the reverse.
pub struct Compatibility;

impl Compatibility {
    pub fn check(outer: PolymorphismKind, inner: PolymorphismKind) -> Result<()> {
        use PolymorphismKind::*;

        match (outer, inner) {
            (JoinedTables, JoinedTables) | (JoinedTables, SingleTable) => Ok(()),
            (TablePerClass, _) | (_, TablePerClass) => Err(Error::unsupported_feature(format!(
                "combining {outer} polymorphism with {inner} is not implemented"
            ))),
            (SingleTable, _) => Err(Error::unsupported_feature(format!(
                "nesting {inner} polymorphism inside {outer} polymorphism is not supported"
            ))),
        }
    }
}

/// A subtype configuration, erased over the subtype.
pub(crate) trait SubclassSource<P> {
    fn compile(
        self: Box<Self>,
        kind: PolymorphismKind,
        discriminator_column: &str,
        scope: &BuildScope<'_>,
    ) -> Result<Vec<SubtypePlan<P>>>;
}

/// The steps leading from the polymorphic root to one leaf subtype.
pub(crate) struct SubtypePlan<P> {
    entity: TypeRef,
    matches: Matcher<P>,
    instantiate: Factory<P>,
    steps: Vec<Step<P>>,
}

pub(crate) enum Step<P> {
    /// A table joined to the previous one.
    Table {
        name: String,
        bindings: Vec<ColumnBinding<P>>,
    },

    /// Columns merged into the previous table.
    Merge {
        bindings: Vec<ColumnBinding<P>>,
        discriminator: Discriminator,
    },
}

impl<P: 'static> Step<P> {
    fn lift<Q: 'static>(&self, lens: &PartialLens<Q, P>) -> Step<Q> {
        let lift = |bindings: &[ColumnBinding<P>]| -> Vec<ColumnBinding<Q>> {
            bindings
                .iter()
                .map(|binding| binding.lift_partial(lens))
                .collect()
        };

        match self {
            Step::Table { name, bindings } => Step::Table {
                name: name.clone(),
                bindings: lift(bindings),
            },
            Step::Merge {
                bindings,
                discriminator,
            } => Step::Merge {
                bindings: lift(bindings),
                discriminator: discriminator.clone(),
            },
        }
    }
}

impl<P> Clone for Step<P> {
    fn clone(&self) -> Self {
        match self {
            Step::Table { name, bindings } => Step::Table {
                name: name.clone(),
                bindings: bindings.clone(),
            },
            Step::Merge {
                bindings,
                discriminator,
            } => Step::Merge {
                bindings: bindings.clone(),
                discriminator: discriminator.clone(),
            },
        }
    }
}

impl<S: Entity> SubtypePlan<S> {
    fn lift<P: Entity>(
        self,
        subclass: &PartialLens<P, S>,
        upcast: &Arc<dyn Fn(S) -> P + Send + Sync>,
    ) -> SubtypePlan<P> {
        let downcast = subclass.clone();
        let matches = self.matches;
        let upcast = upcast.clone();
        let instantiate = self.instantiate;

        SubtypePlan {
            entity: self.entity,
            matches: Arc::new(move |entity: &P| {
                downcast.get(entity).is_some_and(|sub| matches(sub))
            }),
            instantiate: Arc::new(move || upcast(instantiate())),
            steps: self.steps.iter().map(|step| step.lift(subclass)).collect(),
        }
    }
}

impl<P: Entity, S: Entity> SubclassSource<P> for SubEntity<P, S> {
    fn compile(
        self: Box<Self>,
        kind: PolymorphismKind,
        discriminator_column: &str,
        scope: &BuildScope<'_>,
    ) -> Result<Vec<SubtypePlan<P>>> {
        let SubEntity {
            downcast,
            upcast,
            properties,
            discriminator,
            polymorphism,
            table_name,
        } = *self;
        let entity = TypeRef::of::<S>();

        let bindings = embedded::compile(properties, &scope.naming().column)?.bindings;
        let step = match kind {
            PolymorphismKind::JoinedTables => Step::Table {
                name: scope.table_name(table_name.as_deref(), entity),
                bindings,
            },
            PolymorphismKind::SingleTable => Step::Merge {
                bindings,
                discriminator: Discriminator {
                    column: discriminator_column.to_string(),
                    value: Value::from(discriminator.unwrap_or_else(|| entity.simple_name())),
                },
            },
            PolymorphismKind::TablePerClass => return Err(table_per_class()),
        };

        let plans = match polymorphism {
            Some(nested) => {
                Compatibility::check(kind, nested.kind)?;
                let mut plans = subtype_plans(nested, discriminator_column, scope)?;
                for plan in &mut plans {
                    plan.steps.insert(0, step.clone());
                }
                plans
            }
            None => vec![SubtypePlan {
                entity,
                matches: Arc::new(|_| true),
                instantiate: Arc::new(S::default),
                steps: vec![step],
            }],
        };

        Ok(plans
            .into_iter()
            .map(|plan| plan.lift(&downcast, &upcast))
            .collect())
    }
}

fn subtype_plans<E: Entity>(
    policy: PolymorphismPolicy<E>,
    outer_discriminator: &str,
    scope: &BuildScope<'_>,
) -> Result<Vec<SubtypePlan<E>>> {
    let PolymorphismPolicy {
        kind,
        subclasses,
        discriminator_column,
    } = policy;

    if subclasses.is_empty() {
        return Err(Error::invalid_mapping(format!(
            "no subclass is mapped for polymorphic {}",
            TypeRef::of::<E>().simple_name()
        )));
    }

    let discriminator_column = discriminator_column.as_deref().unwrap_or(outer_discriminator);
    let mut plans = vec![];
    for subclass in subclasses {
        plans.extend(subclass.compile(kind, discriminator_column, scope)?);
    }
    Ok(plans)
}

fn table_per_class() -> Error {
    Error::unsupported_feature("table-per-class polymorphism is not implemented")
}

/// Expands `policy` into one variant per leaf subtype, each extending the
/// tables of `hierarchy`.
pub(crate) fn compile<E: Entity>(
    policy: PolymorphismPolicy<E>,
    hierarchy: &Hierarchy<E>,
    scope: &BuildScope<'_>,
) -> Result<Vec<Variant<E>>> {
    if policy.kind == PolymorphismKind::TablePerClass {
        return Err(table_per_class());
    }

    let plans = subtype_plans(policy, scope.cx().discriminator_column(), scope)?;
    let variants: Vec<_> = plans
        .into_iter()
        .map(|plan| materialize(plan, hierarchy))
        .collect::<Result<_>>()?;

    let mut discriminators = HashSet::new();
    for variant in &variants {
        for table in &variant.tables {
            if let Some(discriminator) = &table.discriminator {
                let key = (table.table.as_str(), &discriminator.value);
                if !discriminators.insert(key) {
                    return Err(Error::invalid_mapping(format!(
                        "discriminator value {} is used twice in table {}",
                        discriminator.value, table.table
                    )));
                }
            }
        }
    }

    Ok(variants)
}

fn materialize<E: Entity>(plan: SubtypePlan<E>, hierarchy: &Hierarchy<E>) -> Result<Variant<E>> {
    let mut tables = hierarchy.tables.clone();

    for step in plan.steps {
        let Some(previous) = tables.last_mut() else {
            return Err(Error::invalid_mapping("polymorphic entity has no table"));
        };

        match step {
            Step::Table { name, bindings } => {
                let table = ClassMappingStrategy {
                    table: name,
                    identifier: hierarchy.identifier.binding.clone(),
                    bindings,
                    discriminator: None,
                    parent: Some(previous.table.clone()),
                };
                tables.push(table);
            }
            Step::Merge {
                bindings,
                discriminator,
            } => {
                previous
                    .bindings
                    .extend(bindings.into_iter().map(|binding| binding.with_nullable(true)));
                previous.discriminator = Some(discriminator);
            }
        }
    }

    Ok(Variant {
        entity: plan.entity,
        matches: plan.matches,
        instantiate: plan.instantiate,
        tables,
    })
}
