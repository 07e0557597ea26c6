/// 判断字符串是否以任意给定前缀开头
/// Checks whether the string starts with any of the given prefixes
pub fn starts_with_any<S: AsRef<str>>(value: &str, prefixes: &[S]) -> bool {
    prefixes
        .iter()
        .any(|prefix| value.starts_with(prefix.as_ref()))
}
