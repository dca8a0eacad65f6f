use std::io::Read;

use flalloc::{Heap, Sbrk};
use libc::sbrk;

/// Waits until the user presses ENTER.
/// Useful when you want to inspect memory state with tools like `pmap`,
/// `htop`, `gdb`, or just visually track how the program break moves.
fn block_until_enter_pressed() {
  println!("\n>>> Press ENTER to continue...");
  let _ = std::io::stdin().bytes().next();
}

/// Prints the current program break using `sbrk(0)`.
unsafe fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  env_logger::init();

  // The heap grows the real data segment through sbrk; set RUST_LOG=debug
  // to watch every extend/fit/split decision.
  let mut heap = Heap::new(Sbrk).expect("sbrk could not supply the initial heap");

  unsafe {
    print_program_break("start");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 1) Two small allocations. Both come out of the first chunk-sized
    //    extension; the break moves once, not twice.
    // --------------------------------------------------------------------
    let first = heap.allocate(24).unwrap();
    let second = heap.allocate(24).unwrap();
    println!("\n[1] Allocated 24 + 24 bytes at {:?} and {:?}", first, second);
    print_program_break("after small allocations");

    first.as_ptr().write(0xAB);
    println!("[1] Wrote 0xAB through the first pointer, read back 0x{:X}", first.as_ptr().read());

    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 2) Free the first block, allocate again: first fit hands the same
    //    address back instead of moving the break.
    // --------------------------------------------------------------------
    heap.free(Some(first));
    let third = heap.allocate(24).unwrap();
    println!(
      "\n[2] third == first? {}",
      if third == first {
        "Yes, the freed block was reused"
      } else {
        "No, it was allocated somewhere else"
      }
    );
    print_program_break("after reuse");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 3) Resize: the contents move with the block.
    // --------------------------------------------------------------------
    for i in 0..24u8 {
      third.as_ptr().add(i as usize).write(i);
    }
    let bigger = heap.resize(Some(third), 200).unwrap();
    println!("\n[3] Resized 24 -> 200 bytes, {:?} -> {:?}", third, bigger);
    println!("[3] First bytes after the move: {} {} {}",
      bigger.as_ptr().read(),
      bigger.as_ptr().add(1).read(),
      bigger.as_ptr().add(2).read(),
    );
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 4) A large allocation forces the break to move visibly.
    // --------------------------------------------------------------------
    print_program_break("before large allocation");
    let big = heap.allocate(256 * 1024).unwrap();
    println!("\n[4] Allocated 256 KiB at {:?}", big);
    print_program_break("after large allocation");
    block_until_enter_pressed();

    // --------------------------------------------------------------------
    // 5) Check the heap, then exit. Freed memory stays with the process;
    //    the OS reclaims everything on exit.
    // --------------------------------------------------------------------
    heap.free(Some(bigger));
    heap.free(Some(second));
    heap.free(Some(big));

    match heap.check() {
      Ok(()) => println!("\n[5] Heap invariants hold. Done."),
      Err(violations) => {
        for violation in violations {
          eprintln!("[5] {}", violation);
        }
      }
    }
  }
}
