use crate::member::{Lens, MemberPath, PartialLens, Property};
use crate::primitive::{EnumEncoding, MappedEnum, Primitive};
use crate::Result;

use trellis_core::stmt::{Type, Value};

use std::fmt;
use std::sync::Arc;

type Read<E> = Arc<dyn Fn(&E) -> Value + Send + Sync>;
type Write<E> = Arc<dyn Fn(&mut E, Value) -> Result<()> + Send + Sync>;

/// Binds one column to a value of `E`.
///
/// Bindings compiled against a nested type are lifted through lenses so that
/// every binding of an entity operates on the entity itself.
pub struct ColumnBinding<E> {
    member: Option<MemberPath>,
    column: String,
    ty: Type,
    nullable: bool,
    read: Read<E>,
    write: Option<Write<E>>,
}

impl<E: 'static> ColumnBinding<E> {
    pub(crate) fn property<V: Primitive>(property: &Property<E, V>, column: String) -> Self {
        let get = property.clone();
        let set = property.clone();

        ColumnBinding {
            member: Some(crate::member::Member::path(property).clone()),
            column,
            ty: V::TYPE,
            nullable: V::NULLABLE,
            read: Arc::new(move |entity: &E| get.get(entity).into_value()),
            write: Some(Arc::new(move |entity: &mut E, value: Value| {
                set.set(entity, V::load(value)?);
                Ok(())
            })),
        }
    }

    pub(crate) fn enumeration<M: MappedEnum>(
        property: &Property<E, M>,
        column: String,
        encoding: EnumEncoding,
    ) -> Self {
        let get = property.clone();
        let set = property.clone();

        ColumnBinding {
            member: Some(crate::member::Member::path(property).clone()),
            column,
            ty: encoding.ty(),
            nullable: false,
            read: Arc::new(move |entity: &E| encoding.encode(get.get(entity))),
            write: Some(Arc::new(move |entity: &mut E, value: Value| {
                set.set(entity, encoding.decode(value)?);
                Ok(())
            })),
        }
    }

    /// A column with no member behind it, such as a foreign key maintained by
    /// a relation. Shadow columns are written but never loaded.
    pub(crate) fn shadow<F>(column: String, ty: Type, read: F) -> Self
    where
        F: Fn(&E) -> Value + Send + Sync + 'static,
    {
        ColumnBinding {
            member: None,
            column,
            ty,
            nullable: true,
            read: Arc::new(read),
            write: None,
        }
    }

    /// Rebinds this binding to the type `lens` focuses from.
    pub(crate) fn lift<P: 'static>(&self, lens: &Lens<P, E>) -> ColumnBinding<P> {
        let read = self.read.clone();
        let focus = lens.clone();
        let focus_mut = lens.clone();

        ColumnBinding {
            member: self
                .member
                .as_ref()
                .map(|member| crate::member::Member::path(lens).join(member)),
            column: self.column.clone(),
            ty: self.ty,
            nullable: self.nullable,
            read: Arc::new(move |entity: &P| read(focus.get(entity))),
            write: self.write.clone().map(|write| -> Write<P> {
                Arc::new(move |entity: &mut P, value: Value| write(focus_mut.get_mut(entity), value))
            }),
        }
    }

    /// Rebinds this binding to a polymorphic parent. Reading a parent that is
    /// not of type `E` yields `NULL`.
    pub(crate) fn lift_partial<P: 'static>(&self, lens: &PartialLens<P, E>) -> ColumnBinding<P> {
        let read = self.read.clone();
        let focus = lens.clone();
        let focus_mut = lens.clone();
        let column = self.column.clone();

        ColumnBinding {
            member: self.member.clone(),
            column: self.column.clone(),
            ty: self.ty,
            nullable: self.nullable,
            read: Arc::new(move |entity: &P| focus.get(entity).map(|e| read(e)).unwrap_or_default()),
            write: self.write.clone().map(|write| -> Write<P> {
                Arc::new(move |entity: &mut P, value: Value| match focus_mut.get_mut(entity) {
                    Some(entity) => write(entity, value),
                    None => Err(trellis_core::err!(
                        "column {column} does not apply to this instance"
                    )),
                })
            }),
        }
    }

    pub(crate) fn with_column(mut self, column: String) -> Self {
        self.column = column;
        self
    }

    pub(crate) fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn member(&self) -> Option<&MemberPath> {
        self.member.as_ref()
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_shadow(&self) -> bool {
        self.member.is_none()
    }

    pub fn read(&self, entity: &E) -> Value {
        (self.read)(entity)
    }

    /// Assigns `value` to the bound member. Shadow columns ignore writes.
    pub fn write(&self, entity: &mut E, value: Value) -> Result<()> {
        match &self.write {
            Some(write) => write(entity, value),
            None => Ok(()),
        }
    }
}

impl<E> Clone for ColumnBinding<E> {
    fn clone(&self) -> Self {
        ColumnBinding {
            member: self.member.clone(),
            column: self.column.clone(),
            ty: self.ty,
            nullable: self.nullable,
            read: self.read.clone(),
            write: self.write.clone(),
        }
    }
}

impl<E> fmt::Debug for ColumnBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("member", &self.member)
            .field("column", &self.column)
            .field("ty", &self.ty)
            .field("nullable", &self.nullable)
            .finish()
    }
}
