/*!

Join sequences with a separator.

*/

use std::fmt::Display;

pub fn join_iter<I, T>(iter: I, separator: &str) -> String
    where I: IntoIterator<Item = T>,
          T: Display
{
  let mut result = String::new();
  for (i, item) in iter.into_iter().enumerate() {
    if i > 0 {
      result.push_str(separator);
    }
    result.push_str(&item.to_string());
  }
  result
}

#[inline(always)]
pub fn join_string<I, T>(iter: I) -> String
    where I: IntoIterator<Item = T>,
          T: Display
{
  join_iter(iter, ", ")
}
