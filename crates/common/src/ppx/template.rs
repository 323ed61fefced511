//! Named-slot substitution for the profile template

use crate::{Error, Result};

/// Replace every `{{name}}` in `template` with the matching slot value.
///
/// Substitution is single pass: slot values are copied verbatim and never
/// rescanned, so data containing `{{...}}` cannot inject into other slots.
/// Unknown slot names, unterminated slots and slots the template never uses
/// are all errors.
pub fn fill_slots(template: &str, slots: &[(&str, &str)]) -> Result<String> {
    let capacity = template.len() + slots.iter().map(|(_, v)| v.len()).sum::<usize>();
    let mut out = String::with_capacity(capacity);
    let mut used = vec![false; slots.len()];
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::Template("unterminated slot".to_string()))?;
        let name = after[..end].trim();

        let index = slots
            .iter()
            .position(|(slot, _)| *slot == name)
            .ok_or_else(|| Error::Template(format!("unknown slot `{}`", name)))?;
        out.push_str(slots[index].1);
        used[index] = true;

        rest = &after[end + 2..];
    }
    out.push_str(rest);

    if let Some(index) = used.iter().position(|u| !u) {
        return Err(Error::Template(format!(
            "template has no slot `{}`",
            slots[index].0
        )));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_named_slots() {
        let out = fill_slots("<a>{{x}}</a><b>{{ y }}</b>", &[("x", "1"), ("y", "2")]).unwrap();
        assert_eq!(out, "<a>1</a><b>2</b>");
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let out = fill_slots("{{x}}|{{y}}", &[("x", "{{y}}"), ("y", "v")]).unwrap();
        assert_eq!(out, "{{y}}|v");
    }

    #[test]
    fn test_unknown_slot() {
        let err = fill_slots("{{nope}}", &[]).unwrap_err();
        assert!(matches!(err, Error::Template(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_unterminated_slot() {
        assert!(fill_slots("abc {{x", &[("x", "1")]).is_err());
    }

    #[test]
    fn test_unused_slot() {
        let err = fill_slots("plain", &[("x", "1")]).unwrap_err();
        assert!(matches!(err, Error::Template(msg) if msg.contains("`x`")));
    }
}
