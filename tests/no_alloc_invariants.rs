#![cfg_attr(miri, ignore)]
// Counting allocator that only counts on the thread that switched it on.
use fixedwire::*;
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

mod test_harness;
use test_harness::*;

struct CountingAlloc;

thread_local! {
    static COUNTING: Cell<bool> = const { Cell::new(false) };
    static ALLOC_COUNT: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNTING.try_with(Cell::get).unwrap_or(false) {
            let _ = ALLOC_COUNT.try_with(|n| n.set(n.get() + 1));
        }
        System.alloc(layout)
    }
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GA: CountingAlloc = CountingAlloc;

fn count_allocs<R>(f: impl FnOnce() -> R) -> (R, usize) {
    ALLOC_COUNT.with(|n| n.set(0));
    COUNTING.with(|c| c.set(true));
    let result = f();
    COUNTING.with(|c| c.set(false));
    (result, ALLOC_COUNT.with(Cell::get))
}

#[test]
fn zero_alloc_build_encode_decode() {
    // Built outside the measured region only to compare against.
    let expected = telemetry();

    let (decoded, allocs) = count_allocs(|| {
        let mut t = Telemetry::default();
        t.mode.set(Mode::Armed).unwrap();
        t.online.set(true).unwrap();
        t.ratio.set(0.25).unwrap();
        t.label.set("pump-7").unwrap();
        t.ports.add(1, 80).unwrap();
        t.ports.add(2, 443).unwrap();
        t.reading.get_mut().value.set(12).unwrap();
        t.reading.get_mut().history.set(&[3, 4]).unwrap();
        t.flags.set(&[0xA, 0xB]).unwrap();

        let mut tagged = get_buffer!(Telemetry);
        serialize(&mut tagged, &t).unwrap();
        let a = deserialize(&tagged).unwrap();

        let mut fixed = get_buffer!(Telemetry, XorParity, StaticLayout);
        serialize(&mut fixed, &a).unwrap();
        deserialize_any(&fixed).unwrap()
    });
    assert_eq!(allocs, 0, "encode/decode path allocated");
    assert_eq!(decoded, expected);
}

#[test]
fn zero_alloc_on_failures() {
    let (outcomes, allocs) = count_allocs(|| {
        let mut buffer = get_buffer!(Reading);
        let missing = Reading::default();
        let refused = serialize(&mut buffer, &missing).is_err();

        let mut r = Reading::default();
        let rejected = r.value.set(-1).is_err();
        r.value.set(1).unwrap();
        serialize(&mut buffer, &r).unwrap();

        let mut frame = [0u8; 32];
        let len = buffer.len();
        frame[..len].copy_from_slice(buffer.as_bytes());
        frame[5] ^= 0xFF;
        buffer.load(&frame[..len]).unwrap();
        let corrupted = deserialize(&buffer).is_err();
        (refused, rejected, corrupted)
    });
    assert_eq!(allocs, 0, "error path allocated");
    assert_eq!(outcomes, (true, true, true));
}
