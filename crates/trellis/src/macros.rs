/// A [`Property`](crate::member::Property) reading and assigning a field.
///
/// ```ignore
/// let name = property!(Country, name);
/// ```
#[macro_export]
macro_rules! property {
    ($ty:ty, $field:ident) => {
        $crate::member::Property::field(
            stringify!($field),
            |entity: &$ty| entity.$field.clone(),
            |entity: &mut $ty, value| entity.$field = value,
        )
    };
}

/// A [`Lens`](crate::member::Lens) focusing a field.
///
/// ```ignore
/// let timestamp = lens!(Country, timestamp);
/// ```
#[macro_export]
macro_rules! lens {
    ($ty:ty, $field:ident) => {
        $crate::member::Lens::field(
            stringify!($field),
            |entity: &$ty| &entity.$field,
            |entity: &mut $ty| &mut entity.$field,
        )
    };
}
