/// Builds a [`RawObject`](crate::RawObject) from literal entries.
///
/// Keys are string literals; values are anything that converts into a
/// [`Value`](crate::Value), including nested `object!` invocations.
///
/// ```
/// # use reactive_core::*;
/// let user = object! {
///     "name": "Alice",
///     "address": object! {
///         "city": "Oslo",
///     },
/// };
///
/// assert_eq!(user.len(), 2);
/// assert_eq!(user.get("name"), Some(Value::from("Alice")));
/// assert!(user.get("address").unwrap().as_object().is_some());
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::RawObject::new()
    };
    ($($key:literal : $value:expr),+ $(,)?) => {{
        let object = $crate::RawObject::new();
        $(
            object.insert($key, $value);
        )+
        object
    }};
}
