/*!

Reference counted pointers with stable mutability, and complementary weak pointers. The saturation
core is single-threaded cooperative, so `Rc<RefCell<T>>` is the backing implementation; a
multithreaded build would swap in `Arc<Mutex<T>>` here without touching client code.

*/

use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type RcCell<T>   = Rc<RefCell<T>>;
pub type WeakCell<T> = Weak<RefCell<T>>;

#[inline(always)]
pub fn rc_cell<T>(value: T) -> RcCell<T> {
  Rc::new(RefCell::new(value))
}
