//! Helpers for the type names sessions hand back.
//!
//! Type names are plain strings as the host debugger prints them
//! (`const ns::point<double, 2>`, `Pt[3]`, `std::vector<Pt,std::allocator<Pt> >`).
//! Only the little structure loaders need is recovered here.

const QUALIFIERS: [&str; 5] = ["const ", "volatile ", "struct ", "class ", "union "];

/// Registry key of a type: qualifiers removed, template arguments stripped.
///
/// ```rust
/// use geoscope_core::types::type_id;
///
/// assert_eq!(type_id("const ns::point<double, 2>"), "ns::point");
/// assert_eq!(type_id("  struct Pt "), "Pt");
/// ```
pub fn type_id(type_name: &str) -> String
{
    let mut rest = type_name.trim();
    while let Some(stripped) = QUALIFIERS.iter().find_map(|q| rest.strip_prefix(q)) {
        rest = stripped.trim_start();
    }
    for suffix in [" const", " volatile"] {
        if let Some(stripped) = rest.strip_suffix(suffix) {
            rest = stripped.trim_end();
        }
    }
    match rest.find('<') {
        Some(open) => rest[..open].trim_end().to_string(),
        None => rest.to_string(),
    }
}

/// Top-level template arguments of `type_name`, trimmed.
///
/// ```rust
/// use geoscope_core::types::template_arguments;
///
/// let args = template_arguments("std::vector<ns::pt<int>, std::allocator<ns::pt<int> > >");
/// assert_eq!(args, vec!["ns::pt<int>", "std::allocator<ns::pt<int> >"]);
/// ```
pub fn template_arguments(type_name: &str) -> Vec<String>
{
    let Some(open) = type_name.find('<') else {
        return Vec::new();
    };

    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = open + 1;
    for (offset, ch) in type_name[open..].char_indices() {
        let index = open + offset;
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    push_argument(&mut args, &type_name[start..index]);
                    return args;
                }
            }
            ',' if depth == 1 => {
                push_argument(&mut args, &type_name[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    // unbalanced: keep what was complete
    args
}

fn push_argument(args: &mut Vec<String>, raw: &str)
{
    let arg = raw.trim();
    if !arg.is_empty() {
        args.push(arg.to_string());
    }
}

/// Split a C array type `T[N]` into its element type and extent.
///
/// Multi-dimensional arrays peel the outermost extent:
/// `int[2][3]` is two elements of `int[3]`.
///
/// ```rust
/// use geoscope_core::types::split_array_type;
///
/// assert_eq!(split_array_type("Pt[3]"), Some(("Pt".to_string(), 3)));
/// assert_eq!(split_array_type("int[2][3]"), Some(("int[3]".to_string(), 2)));
/// assert_eq!(split_array_type("std::vector<Pt>"), None);
/// ```
pub fn split_array_type(type_name: &str) -> Option<(String, usize)>
{
    let name = type_name.trim();
    if !name.ends_with(']') {
        return None;
    }

    let mut depth = 0usize;
    let open = name.char_indices().find_map(|(index, ch)| {
        match ch {
            '<' | '(' => depth += 1,
            '>' | ')' => depth = depth.saturating_sub(1),
            '[' if depth == 0 => return Some(index),
            _ => {}
        }
        None
    })?;
    let close = open + name[open..].find(']')?;
    let extent = name[open + 1..close].trim().parse::<usize>().ok()?;
    let element = format!("{}{}", name[..open].trim_end(), &name[close + 1..]);
    if element.is_empty() {
        return None;
    }
    Some((element, extent))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_type_id_plain()
    {
        assert_eq!(type_id("Pt"), "Pt");
        assert_eq!(type_id("volatile const Pt"), "Pt");
        assert_eq!(type_id("Pt const"), "Pt");
    }

    #[test]
    fn test_type_id_template()
    {
        assert_eq!(type_id("boost::geometry::model::point<double,2,cs::cartesian>"), "boost::geometry::model::point");
    }

    #[test]
    fn test_template_arguments_empty()
    {
        assert!(template_arguments("Pt").is_empty());
        assert!(template_arguments("std::vector<>").is_empty());
    }

    #[test]
    fn test_template_arguments_nested_commas()
    {
        let args = template_arguments("std::map<std::pair<int,int>, Pt>");
        assert_eq!(args, vec!["std::pair<int,int>", "Pt"]);
    }

    #[test]
    fn test_split_array_type_rejects_garbage()
    {
        assert_eq!(split_array_type("Pt[]"), None);
        assert_eq!(split_array_type("Pt[n]"), None);
        assert_eq!(split_array_type("[3]"), None);
    }

    #[test]
    fn test_split_array_type_template_element()
    {
        assert_eq!(split_array_type("ns::pt<int[2]>[4]"), Some(("ns::pt<int[2]>".to_string(), 4)));
    }
}
