//! Small utility helpers used across modules.

use rand::seq::SliceRandom;

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Comma-joined copy of `items` in random order.
/// Shuffling the category list per attempt nudges the model off its previous answer.
pub fn shuffled_list(items: &[String]) -> String {
  let mut v: Vec<&str> = items.iter().map(String::as_str).collect();
  v.shuffle(&mut rand::thread_rng());
  v.join(", ")
}

/// Log-safe truncation for large strings (char-boundary aware).
pub fn trunc_for_log(s: &str, max: usize) -> String {
  match s.char_indices().nth(max) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}
