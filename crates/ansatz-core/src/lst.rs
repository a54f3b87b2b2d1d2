//! Ordered lists.

use crate::config::Budget;
use crate::error::{Error, Result};
use crate::eval::{eval_children, Mode, Rewrite};
use crate::handle::Ex;
use crate::node::Kind;

pub(crate) fn eval(items: &[Ex], mode: Mode, budget: Budget) -> Result<Rewrite> {
    let (items, changed) = eval_children(items, mode, budget)?;
    if changed {
        Ok(Rewrite::Hold(Kind::List(items)))
    } else {
        Ok(Rewrite::Keep)
    }
}

impl Ex {
    /// The items of a list.
    #[must_use]
    pub fn items(&self) -> Option<&[Ex]> {
        match self.kind() {
            Kind::List(items) => Some(items),
            _ => None,
        }
    }

    /// Appends to a uniquely owned list, clearing its `evaluated` flag.
    ///
    /// # Errors
    ///
    /// - [`Error::Unsupported`] if this is not a list.
    /// - [`Error::NotModifiable`] if the list is shared.
    pub fn append(&mut self, item: Ex) -> Result<()> {
        if self.items().is_none() {
            return Err(Error::Unsupported {
                operation: "append",
                tag: self.tag().name(),
            });
        }
        if let Kind::List(items) = self.try_mut()? {
            items.push(item);
        }
        self.clear_evaluated()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_respects_sharing() {
        let x = Ex::symbol("x");
        let mut list = Ex::list([x.clone()]).eval().unwrap();
        let alias = list.clone();
        assert_eq!(list.append(x.clone()), Err(Error::NotModifiable));
        drop(alias);

        list.append(Ex::integer(2)).unwrap();
        assert_eq!(list.nops(), 2);
        assert!(!list.is_evaluated());
        assert!(list.eval().unwrap().is_evaluated());
    }

    #[test]
    fn test_append_to_non_list() {
        let mut x = Ex::symbol("x");
        assert!(matches!(
            x.append(Ex::integer(1)),
            Err(Error::Unsupported { .. })
        ));
    }

    #[test]
    fn test_items_are_evaluated() {
        let x = Ex::symbol("x");
        let list = Ex::list([&x + &x, x.clone()]).eval().unwrap();
        let items = list.items().unwrap();
        assert_eq!(items[0], Ex::mul([Ex::integer(2), x.clone()]).eval().unwrap());
        assert!(items[1].ptr_eq(&x));
    }
}
