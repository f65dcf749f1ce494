//! # tickwatch Firmware
//!
//! Bare-metal image for an STM32F4 target: wires the periodic task set to
//! real pins and a USART, calibrates the synthetic-load spin rate, registers
//! the declarative task table, and drives the whole set from a minimal
//! periodic release harness.
//!
//! The harness stands in for the platform's deadline scheduler: it releases
//! each task once per its period and brackets every activation with the
//! switch hooks, but runs activations to completion in table order. A
//! production integration hands the same table and hook entry points to the
//! real preemptive scheduler and deletes the harness.
//!
//! Pin map (logic-analyzer friendly, one signal per observable):
//!
//! | Signal                    | Pin  |
//! |---------------------------|------|
//! | tick pulse                | PC0  |
//! | task activation marks     | PC1–PC6 (table order) |
//! | idle context mark         | PC7  |
//! | monitored inputs          | PB0, PB1 (pull-up, idle high) |
//! | serial sink               | USART1 TX on PA9, 115200 8N1 |

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::ptr::addr_of_mut;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m::peripheral::syst::SystClkSource;
    use cortex_m::singleton;
    use cortex_m_rt::{entry, exception};
    use panic_halt as _;
    use rtt_target::{rprintln, rtt_init_print};
    use stm32f4xx_hal::{
        gpio::{ErasedPin, Input, Output, PushPull},
        pac,
        prelude::*,
        serial::{config::Config, Serial, Tx},
    };

    use tickwatch::config::{
        DIAG_REPORT_PERIOD, LOAD_LONG_WORK_TICKS, LOAD_SHORT_WORK_TICKS, SPIN_PROBE_ITERS,
        SYSTEM_CLOCK_HZ, TASK_PRIORITY_HINT, TASK_STACK_WORDS, TICK_HZ,
    };
    use tickwatch::hooks;
    use tickwatch::io::{InputPin, Level, OutputPin, SerialSink, SwitchObserver, TickSource};
    use tickwatch::load::CalibratedSpin;
    use tickwatch::queue::SharedQueue;
    use tickwatch::registry::{self, RegisterError, SchedulerPort};
    use tickwatch::task::{TaskEntry, TaskSlot, TaskSpec, TraceId};
    use tickwatch::tasks::{
        run_activation, EdgeMonitor, QueueDrain, StatusTransmitter, SyntheticLoad,
        INPUT_A_FALLING, INPUT_A_RISING, INPUT_B_FALLING, INPUT_B_RISING, STATUS_MESSAGE,
    };

    // -----------------------------------------------------------------------
    // Driver adapters
    // -----------------------------------------------------------------------

    /// Discrete input over an erased HAL pin.
    struct Din(ErasedPin<Input>);

    impl InputPin for Din {
        fn read(&mut self) -> Level {
            if self.0.is_high() {
                Level::High
            } else {
                Level::Low
            }
        }
    }

    /// Discrete output over an erased HAL pin.
    struct Dout(ErasedPin<Output<PushPull>>);

    impl OutputPin for Dout {
        fn set(&mut self, level: Level) {
            match level {
                Level::High => self.0.set_high(),
                Level::Low => self.0.set_low(),
            }
        }
    }

    /// Serial sink over the USART1 transmitter.
    struct UartSink(Tx<pac::USART1>);

    impl SerialSink for UartSink {
        fn write(&mut self, bytes: &[u8]) {
            for &byte in bytes {
                let _ = nb::block!(self.0.write(byte));
            }
        }
    }

    // -----------------------------------------------------------------------
    // Time bases
    // -----------------------------------------------------------------------

    /// Scheduler tick count, advanced by the SysTick interrupt. Deadlines
    /// and periods are measured in these.
    static TICKS: AtomicU32 = AtomicU32::new(0);

    struct SysTicks;

    impl TickSource for SysTicks {
        fn now(&self) -> u32 {
            TICKS.load(Ordering::Relaxed)
        }
    }

    /// Free-running DWT cycle counter, the fine-grained trace timebase.
    struct CycleCounter;

    impl TickSource for CycleCounter {
        fn now(&self) -> u32 {
            cortex_m::peripheral::DWT::cycle_count()
        }
    }

    fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
        let reload = SYSTEM_CLOCK_HZ / TICK_HZ - 1;
        syst.set_reload(reload);
        syst.clear_current();
        syst.set_clock_source(SystClkSource::Core);
        syst.enable_counter();
        syst.enable_interrupt();
    }

    #[exception]
    fn SysTick() {
        TICKS.fetch_add(1, Ordering::Relaxed);
        hooks::on_tick();
    }

    // -----------------------------------------------------------------------
    // Observation pins
    // -----------------------------------------------------------------------

    /// Drives the idle context mark and the tick pulse. Task activation pins
    /// are owned by the activation brackets, so task context marks are
    /// already visible there and ignored here.
    struct PinObserver {
        idle_pin: Dout,
        tick_pin: Dout,
    }

    impl SwitchObserver for PinObserver {
        fn context_mark(&mut self, id: TraceId, level: Level) {
            if let TraceId::Idle = id {
                self.idle_pin.set(level);
            }
        }

        fn tick_pulse(&mut self) {
            self.tick_pin.set_high();
            self.tick_pin.set_low();
        }
    }

    // -----------------------------------------------------------------------
    // Task instances
    // -----------------------------------------------------------------------

    /// Everything the six activation bodies own: task state, the per-task
    /// observation pins, and the serial sink the drain forwards into.
    struct TaskSet {
        edge_a: EdgeMonitor<Din>,
        edge_a_pin: Dout,
        edge_b: EdgeMonitor<Din>,
        edge_b_pin: Dout,
        status: StatusTransmitter,
        status_pin: Dout,
        drain: QueueDrain,
        drain_pin: Dout,
        serial: UartSink,
        load_short: SyntheticLoad,
        load_short_pin: Dout,
        load_long: SyntheticLoad,
        load_long_pin: Dout,
    }

    /// Populated once in `main` before the harness starts releasing tasks;
    /// entries are only ever invoked sequentially by the harness after that.
    static mut TASKS: Option<TaskSet> = None;

    fn task_set() -> Option<&'static mut TaskSet> {
        // The harness is the only caller and runs activations one at a time.
        unsafe { (*addr_of_mut!(TASKS)).as_mut() }
    }

    fn edge_a_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::EdgeMonitorA, &mut t.edge_a_pin, &SysTicks, || {
            t.edge_a.activate(&mut SharedQueue)
        });
    }

    fn edge_b_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::EdgeMonitorB, &mut t.edge_b_pin, &SysTicks, || {
            t.edge_b.activate(&mut SharedQueue)
        });
    }

    fn status_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::StatusTx, &mut t.status_pin, &SysTicks, || {
            t.status.activate(&mut SharedQueue)
        });
    }

    fn drain_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::QueueDrain, &mut t.drain_pin, &SysTicks, || {
            t.drain.activate(&mut SharedQueue, &mut t.serial)
        });
    }

    fn load_short_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::LoadShort, &mut t.load_short_pin, &SysTicks, || {
            t.load_short.activate()
        });
    }

    fn load_long_entry(_arg: usize) {
        let Some(t) = task_set() else { return };
        run_activation(TaskSlot::LoadLong, &mut t.load_long_pin, &SysTicks, || {
            t.load_long.activate()
        });
    }

    const fn spec(slot: TaskSlot, entry: TaskEntry) -> TaskSpec {
        TaskSpec {
            slot,
            name: slot.name(),
            entry,
            arg: 0,
            stack_words: TASK_STACK_WORDS,
            priority_hint: TASK_PRIORITY_HINT,
        }
    }

    /// The whole task set as data. Registration walks this table; nothing
    /// else in the image hard-codes the task count.
    static TASK_TABLE: [TaskSpec; TaskSlot::COUNT] = [
        spec(TaskSlot::EdgeMonitorA, edge_a_entry),
        spec(TaskSlot::EdgeMonitorB, edge_b_entry),
        spec(TaskSlot::StatusTx, status_entry),
        spec(TaskSlot::QueueDrain, drain_entry),
        spec(TaskSlot::LoadShort, load_short_entry),
        spec(TaskSlot::LoadLong, load_long_entry),
    ];

    // -----------------------------------------------------------------------
    // Release harness
    // -----------------------------------------------------------------------

    #[derive(Clone, Copy)]
    struct Release {
        spec: TaskSpec,
        next: u32,
    }

    /// Minimal periodic release harness implementing the scheduler seam.
    /// Releases each registered task once per its period, bracketing every
    /// activation with the switch hooks, and parks in `wfi` when nothing is
    /// due. Runs activations to completion in table order.
    struct ReleaseHarness {
        releases: [Option<Release>; TaskSlot::COUNT],
        count: usize,
    }

    impl ReleaseHarness {
        const fn new() -> Self {
            Self {
                releases: [None; TaskSlot::COUNT],
                count: 0,
            }
        }

        fn run(&mut self) -> ! {
            let mut next_report = DIAG_REPORT_PERIOD;
            loop {
                let now = SysTicks.now();
                let mut dispatched = false;

                for release in self.releases.iter_mut().flatten() {
                    if due(now, release.next) {
                        let id = TraceId::Task(release.spec.slot);
                        hooks::on_switch_in(id, CycleCounter.now());
                        (release.spec.entry)(release.spec.arg);
                        hooks::on_switch_out(id, CycleCounter.now());
                        release.next = release.next.wrapping_add(release.spec.period());
                        dispatched = true;
                    }
                }

                if due(now, next_report) {
                    let snap = hooks::snapshot();
                    rprintln!(
                        "t={} load={}% misses={:?}",
                        now,
                        snap.load_percent,
                        snap.deadline_misses
                    );
                    next_report = next_report.wrapping_add(DIAG_REPORT_PERIOD);
                }

                if !dispatched {
                    hooks::on_switch_in(TraceId::Idle, CycleCounter.now());
                    cortex_m::asm::wfi();
                    hooks::on_switch_out(TraceId::Idle, CycleCounter.now());
                }
            }
        }
    }

    /// Wrap-safe "now has reached next" comparison.
    fn due(now: u32, next: u32) -> bool {
        now.wrapping_sub(next) as i32 >= 0
    }

    impl SchedulerPort for ReleaseHarness {
        fn register_periodic_task(&mut self, spec: &TaskSpec) -> Result<(), RegisterError> {
            if self.count == self.releases.len() {
                return Err(RegisterError::Exhausted);
            }
            self.releases[self.count] = Some(Release {
                spec: *spec,
                next: spec.period(),
            });
            self.count += 1;
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Entry point
    // -----------------------------------------------------------------------

    #[entry]
    fn main() -> ! {
        rtt_init_print!();
        rprintln!("tickwatch boot");

        let mut cp = cortex_m::Peripherals::take().unwrap();
        let dp = pac::Peripherals::take().unwrap();

        let rcc = dp.RCC.constrain();
        let clocks = rcc.cfgr.freeze();

        // Free-running cycle counter for the trace timebase.
        cp.DCB.enable_trace();
        cp.DWT.enable_cycle_counter();

        // Scheduler tick. Started before calibration, which counts in ticks.
        configure_systick(&mut cp.SYST);

        let gpioa = dp.GPIOA.split();
        let gpiob = dp.GPIOB.split();
        let gpioc = dp.GPIOC.split();

        let input_a = Din(gpiob.pb0.into_pull_up_input().erase());
        let input_b = Din(gpiob.pb1.into_pull_up_input().erase());

        let tick_pin = Dout(gpioc.pc0.into_push_pull_output().erase());
        let edge_a_pin = Dout(gpioc.pc1.into_push_pull_output().erase());
        let edge_b_pin = Dout(gpioc.pc2.into_push_pull_output().erase());
        let status_pin = Dout(gpioc.pc3.into_push_pull_output().erase());
        let drain_pin = Dout(gpioc.pc4.into_push_pull_output().erase());
        let load_short_pin = Dout(gpioc.pc5.into_push_pull_output().erase());
        let load_long_pin = Dout(gpioc.pc6.into_push_pull_output().erase());
        let idle_pin = Dout(gpioc.pc7.into_push_pull_output().erase());

        let tx = Serial::tx(
            dp.USART1,
            gpioa.pa9.into_alternate(),
            Config::default().baudrate(115_200.bps()),
            &clocks,
        )
        .expect("USART1 configuration rejected");

        // Measure the spin rate before any load task runs.
        let spin = CalibratedSpin::calibrate(&SysTicks, SPIN_PROBE_ITERS);
        rprintln!("spin rate {} iters/tick", spin.iters_per_tick());

        unsafe {
            *addr_of_mut!(TASKS) = Some(TaskSet {
                edge_a: EdgeMonitor::new(input_a, Level::High, INPUT_A_RISING, INPUT_A_FALLING),
                edge_a_pin,
                edge_b: EdgeMonitor::new(input_b, Level::High, INPUT_B_RISING, INPUT_B_FALLING),
                edge_b_pin,
                status: StatusTransmitter::new(STATUS_MESSAGE),
                status_pin,
                drain: QueueDrain::new(),
                drain_pin,
                serial: UartSink(tx),
                load_short: SyntheticLoad::new(spin, LOAD_SHORT_WORK_TICKS),
                load_short_pin,
                load_long: SyntheticLoad::new(spin, LOAD_LONG_WORK_TICKS),
                load_long_pin,
            });
        }

        let observer = singleton!(: PinObserver = PinObserver { idle_pin, tick_pin })
            .expect("observer already installed");
        hooks::init(observer, CycleCounter.now());

        let mut harness = ReleaseHarness::new();
        match registry::register_task_set(&mut harness, &TASK_TABLE) {
            Ok(()) => rprintln!("{} tasks registered", TASK_TABLE.len()),
            Err(RegisterError::Exhausted) => {
                // The one fatal condition: park instead of degrading.
                rprintln!("task registration exhausted; halting");
                loop {
                    cortex_m::asm::wfi();
                }
            }
        }

        harness.run()
    }
}

/// The firmware image only exists for the bare-metal target; hosted builds
/// (which exist to run the library's tests) get an empty stub.
#[cfg(not(target_os = "none"))]
fn main() {}
