use libc::sbrk;

use brkalloc::global;

/// Prints the current program break using `sbrk(0)`.
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { sbrk(0) },
  );
}

fn main() {
  env_logger::init();
  global::init();

  print_program_break("start");

  let p1 = global::allocate(32);
  let p2 = global::allocate(64);
  let p3 = global::allocate(128);
  let p4 = global::zero_allocate(15, 1);

  println!("\nAfter initial allocations:");
  print!("{}", global::inspect());

  unsafe {
    // Grow p2 to 100 bytes: new block, copy, release the old one.
    let p2 = global::resize(p2, 100);

    global::release(p3);
    global::release(p4);

    println!("\nAfter resize/release:");
    print!("{}", global::inspect());

    global::release(p1);
    global::release(p2);
  }

  println!("\nAfter releasing all:");
  print!("{}", global::inspect());

  print_program_break("end");
  global::shutdown();
}
