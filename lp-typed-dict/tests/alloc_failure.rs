//! Updates under an allocator that refuses large requests.
//!
//! Kept as the only test in this binary so the size limit never applies to
//! another test thread.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};

use lp_typed_dict::{DataType, Diagnostics, DictError, TypedDict, Value};

/// Allocations of at least this many bytes fail. `usize::MAX` disables it.
static FAIL_AT_LEAST: AtomicUsize = AtomicUsize::new(usize::MAX);

struct LimitedAllocator;

#[global_allocator]
static ALLOC: LimitedAllocator = LimitedAllocator;

unsafe impl GlobalAlloc for LimitedAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if layout.size() >= FAIL_AT_LEAST.load(Ordering::Relaxed) {
            return std::ptr::null_mut();
        }
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
    }
}

fn with_limit<T>(limit: usize, f: impl FnOnce() -> T) -> T {
    FAIL_AT_LEAST.store(limit, Ordering::Relaxed);
    let out = f();
    FAIL_AT_LEAST.store(usize::MAX, Ordering::Relaxed);
    out
}

#[derive(Default)]
struct Rejections {
    errors: RefCell<Vec<(String, DictError)>>,
}

impl Diagnostics for Rejections {
    // Only a short prefix of the key: the limit is still active here.
    fn update_rejected(&self, key: &str, error: &DictError) {
        let prefix: String = key.chars().take(16).collect();
        self.errors.borrow_mut().push((prefix, *error));
    }

    fn type_mismatch(&self, _key: &str, _stored: DataType, _requested: DataType) {}
}

const LIMIT: usize = 64 * 1024;

#[test]
fn allocation_failure_leaves_dictionary_unchanged() {
    let rejections = Rejections::default();
    let mut dict = TypedDict::with_diagnostics(&rejections);
    dict.update_int("existing", 1337).unwrap();
    dict.update_bool("other", true).unwrap();

    let big_value = vec![0xA5u8; 4 * LIMIT];
    let big_key = "k".repeat(4 * LIMIT);

    // Value buffer for a new key.
    let result = with_limit(LIMIT, || dict.update_raw("new", &big_value));
    assert_eq!(
        result,
        Err(DictError::AllocationFailed {
            size: big_value.len()
        })
    );
    assert!(!dict.contains("new"));

    // Value buffer for an existing key: old value and tag survive.
    let result = with_limit(LIMIT, || dict.update_raw("existing", &big_value));
    assert!(matches!(result, Err(DictError::AllocationFailed { .. })));
    assert_eq!(dict.get_int("existing"), Some(1337));
    assert_eq!(dict.data_type("existing"), Some(DataType::Int));

    // Key copy fails after the small value buffer succeeded.
    let result = with_limit(LIMIT, || dict.update_int(&big_key, 1));
    assert_eq!(
        result,
        Err(DictError::AllocationFailed {
            size: big_key.len()
        })
    );
    assert!(!dict.contains(&big_key));

    // Fill the first storage chunk so the next new key needs a fresh one,
    // which is far larger than a short key or a bool.
    for i in 0..14 {
        dict.update_bool(&format!("fill{i}"), false).unwrap();
    }
    assert_eq!(dict.len(), 16);
    let result = with_limit(256, || dict.update_bool("seventeenth", true));
    assert!(matches!(result, Err(DictError::AllocationFailed { .. })));
    assert!(!dict.contains("seventeenth"));
    assert_eq!(dict.len(), 16);

    let errors = rejections.errors.take();
    let keys: Vec<&str> = errors.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["new", "existing", &big_key[..16], "seventeenth"]);
    assert!(errors
        .iter()
        .all(|(_, e)| matches!(e, DictError::AllocationFailed { .. })));

    // Nothing was corrupted: the dictionary keeps working once memory frees up.
    dict.update_raw("new", &big_value).unwrap();
    assert_eq!(dict.get_value("new"), Some(Value::Raw(&big_value)));
    dict.update_bool("seventeenth", true).unwrap();
    assert_eq!(dict.len(), 18);
    assert_eq!(dict.get_int("existing"), Some(1337));
}
