use std::fmt::Display;

use phoenix_swap::forwarding;

#[forwarding]
trait Store: Send + Sync {
    fn load<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr;
    fn save<'a>(&self, key: &'a str, value: impl Display + 'a);
    fn batch<const N: usize>(&self, keys: [&str; N]) -> [bool; N];
    fn each(&self, visit: &mut dyn FnMut(&str));
    #[cfg(any())]
    fn disabled(&self);
}

struct Memory;

impl Store for Memory {
    fn load<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        key.parse().ok()
    }

    fn save<'a>(&self, _key: &'a str, _value: impl Display + 'a) {}

    fn batch<const N: usize>(&self, _keys: [&str; N]) -> [bool; N] {
        [false; N]
    }

    fn each(&self, visit: &mut dyn FnMut(&str)) {
        visit("only");
    }
}

fn main() {
    let _ = Memory.load::<u32>("1");
}
