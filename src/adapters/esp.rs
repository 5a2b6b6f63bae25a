//! ESP-IDF board adapter.
//!
//! Implements [`Platform`] on top of the raw ESP-IDF driver calls:
//!
//! | Port          | ESP-IDF API                                        |
//! |---------------|----------------------------------------------------|
//! | `SerialPort`  | `uart_driver_install` / `uart_read_bytes` / `uart_write_bytes` |
//! | `InputPin`    | `gpio_config` / `gpio_get_level`                   |
//! | `OutputPin`   | `gpio_config` / `gpio_set_level`                   |
//! | `Poller`      | `uart_get_buffered_data_len` + interval deadlines  |
//!
//! The poller checks every watched UART's receive buffer and every timer
//! deadline, and sleeps one RTOS tick between checks until something is
//! ready.

use core::time::Duration;
use std::time::Instant;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};
use esp_idf_hal::delay::FreeRtos;
use esp_idf_svc::sys::*;
use log::info;

use crate::app::ports::{Platform, Release};
use crate::config::{FlowControl, SerialConfig};
use crate::dispatch::{Interest, IntervalTimer, MAX_SOURCES, Poller, RawHandle, ReadyList, Token};
use crate::error::DriverError;
use crate::serial::SerialPort;
use crate::termination::{check_signal_install, on_termination_signal};

const UART_RX_BUFFER: i32 = 512;
const UART_TX_BUFFER: i32 = 512;
/// `UART_PIN_NO_CHANGE`
const PIN_UNCHANGED: i32 = -1;

fn esp_result(ret: esp_err_t) -> Result<(), DriverError> {
    if ret == ESP_OK as esp_err_t {
        Ok(())
    } else {
        Err(DriverError::new(ret))
    }
}

// ── Platform ──────────────────────────────────────────────────

#[derive(Default)]
pub struct EspPlatform;

impl EspPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for EspPlatform {
    type Serial = EspUart;
    type Input = EspInput;
    type Output = EspOutput;
    type Poller = EspPoller;

    fn install_termination_handler(&mut self) -> Result<(), DriverError> {
        // SAFETY: the handler only performs one atomic store.
        let previous = unsafe { signal(SIGTERM as i32, Some(on_termination_signal)) };
        check_signal_install(previous.map_or(0, |handler| handler as usize))
    }

    fn create_poller(&mut self) -> Result<EspPoller, DriverError> {
        Ok(EspPoller::default())
    }

    fn open_serial(&mut self, config: &SerialConfig) -> Result<EspUart, DriverError> {
        let flow_ctrl = match config.flow_control {
            FlowControl::None => uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_DISABLE,
            FlowControl::RtsCts => uart_hw_flowcontrol_t_UART_HW_FLOWCTRL_CTS_RTS,
        };
        let uart_cfg = uart_config_t {
            baud_rate: config.baud_rate as i32,
            data_bits: uart_word_length_t_UART_DATA_8_BITS,
            parity: uart_parity_t_UART_PARITY_DISABLE,
            stop_bits: uart_stop_bits_t_UART_STOP_BITS_1,
            flow_ctrl,
            ..Default::default()
        };

        // SAFETY: called once from the single main task during init.
        unsafe {
            esp_result(uart_param_config(config.port, &uart_cfg))?;
            esp_result(uart_set_pin(
                config.port,
                config.tx_pin,
                config.rx_pin,
                PIN_UNCHANGED,
                PIN_UNCHANGED,
            ))?;
            esp_result(uart_driver_install(
                config.port,
                UART_RX_BUFFER,
                UART_TX_BUFFER,
                0,
                core::ptr::null_mut(),
                0,
            ))?;
        }
        info!(
            "esp: UART{} open ({} baud, tx={}, rx={})",
            config.port, config.baud_rate, config.tx_pin, config.rx_pin
        );
        Ok(EspUart { port: config.port })
    }

    fn open_input(&mut self, pin: i32) -> Result<EspInput, DriverError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: configures a pin nothing else owns.
        esp_result(unsafe { gpio_config(&cfg) })?;
        Ok(EspInput { gpio: pin })
    }

    fn open_output(&mut self, pin: i32, initial: PinState) -> Result<EspOutput, DriverError> {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
            ..Default::default()
        };
        // SAFETY: configures a pin nothing else owns.
        esp_result(unsafe { gpio_config(&cfg) })?;
        let mut output = EspOutput { gpio: pin };
        output.set_state(initial)?;
        Ok(output)
    }
}

// ── UART ──────────────────────────────────────────────────────

pub struct EspUart {
    port: uart_port_t,
}

impl SerialPort for EspUart {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, DriverError> {
        // SAFETY: driver installed in open_serial; buf is valid for len bytes.
        // Zero ticks to wait: never blocks.
        let n = unsafe { uart_read_bytes(self.port, buf.as_mut_ptr().cast(), buf.len() as u32, 0) };
        if n < 0 {
            return Err(DriverError::new(DriverError::EIO));
        }
        Ok(n as usize)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, DriverError> {
        // SAFETY: driver installed in open_serial; data is valid for len bytes.
        let n = unsafe { uart_write_bytes(self.port, data.as_ptr().cast(), data.len()) };
        if n < 0 {
            return Err(DriverError::new(DriverError::EIO));
        }
        Ok(n as usize)
    }

    fn raw_handle(&self) -> RawHandle {
        self.port
    }
}

impl Release for EspUart {
    fn release(self) -> Result<(), DriverError> {
        // SAFETY: port was installed by open_serial and is deleted once.
        esp_result(unsafe { uart_driver_delete(self.port) })
    }
}

// ── GPIO ──────────────────────────────────────────────────────

pub struct EspInput {
    gpio: i32,
}

impl ErrorType for EspInput {
    type Error = DriverError;
}

impl InputPin for EspInput {
    fn is_high(&mut self) -> Result<bool, DriverError> {
        // SAFETY: register read on a configured input pin.
        Ok(unsafe { gpio_get_level(self.gpio) } != 0)
    }

    fn is_low(&mut self) -> Result<bool, DriverError> {
        self.is_high().map(|high| !high)
    }
}

impl Release for EspInput {
    fn release(self) -> Result<(), DriverError> {
        // SAFETY: returns the pin to its reset configuration.
        esp_result(unsafe { gpio_reset_pin(self.gpio) })
    }
}

pub struct EspOutput {
    gpio: i32,
}

impl ErrorType for EspOutput {
    type Error = DriverError;
}

impl OutputPin for EspOutput {
    fn set_low(&mut self) -> Result<(), DriverError> {
        // SAFETY: register write on a configured output pin, main task only.
        esp_result(unsafe { gpio_set_level(self.gpio, 0) })
    }

    fn set_high(&mut self) -> Result<(), DriverError> {
        // SAFETY: as above.
        esp_result(unsafe { gpio_set_level(self.gpio, 1) })
    }
}

impl Release for EspOutput {
    fn release(self) -> Result<(), DriverError> {
        // SAFETY: returns the pin to its reset configuration.
        esp_result(unsafe { gpio_reset_pin(self.gpio) })
    }
}

// ── Poller ────────────────────────────────────────────────────

#[derive(Default)]
pub struct EspPoller {
    uarts: heapless::Vec<(Token, uart_port_t), MAX_SOURCES>,
    timers: heapless::Vec<(Token, IntervalTimer), MAX_SOURCES>,
}

impl Poller for EspPoller {
    fn watch(
        &mut self,
        token: Token,
        handle: RawHandle,
        interest: Interest,
    ) -> Result<(), DriverError> {
        let Interest::Readable = interest;
        // SAFETY: pure query.
        if !unsafe { uart_is_driver_installed(handle) } {
            return Err(DriverError::new(DriverError::EBADF));
        }
        self.uarts
            .push((token, handle))
            .map_err(|_| DriverError::new(DriverError::ENOSPC))
    }

    fn add_timer(&mut self, token: Token, period: Duration) -> Result<(), DriverError> {
        if period.is_zero() {
            return Err(DriverError::new(DriverError::EINVAL));
        }
        self.timers
            .push((token, IntervalTimer::new(period, Instant::now())))
            .map_err(|_| DriverError::new(DriverError::ENOSPC))
    }

    fn remove(&mut self, token: Token) -> Result<(), DriverError> {
        if let Some(i) = self.uarts.iter().position(|(t, _)| *t == token) {
            self.uarts.swap_remove(i);
            return Ok(());
        }
        if let Some(i) = self.timers.iter().position(|(t, _)| *t == token) {
            self.timers.swap_remove(i);
            return Ok(());
        }
        Err(DriverError::new(DriverError::EBADF))
    }

    fn wait(&mut self, ready: &mut ReadyList) -> Result<(), DriverError> {
        loop {
            for (token, port) in &self.uarts {
                let mut pending: usize = 0;
                // SAFETY: port was checked in watch(); pending is a valid out-pointer.
                esp_result(unsafe { uart_get_buffered_data_len(*port, &mut pending) })?;
                if pending > 0 {
                    let _ = ready.push(*token);
                }
            }

            let now = Instant::now();
            for (token, timer) in &mut self.timers {
                if timer.expire(now) > 0 {
                    let _ = ready.push(*token);
                }
            }

            if !ready.is_empty() {
                return Ok(());
            }
            // Rounds up to one tick.
            FreeRtos::delay_ms(1);
        }
    }
}

impl Release for EspPoller {
    fn release(mut self) -> Result<(), DriverError> {
        self.uarts.clear();
        self.timers.clear();
        Ok(())
    }
}
