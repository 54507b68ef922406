//! Board bring-up and register-level pin/link implementations
//!
//! Pin map (matches the vendor evaluation board wiring):
//! - SPI1 (master): PA4 NSS, PB3 SCK, PA6 MISO, PA7 MOSI
//! - SPI2 (slave):  PB12 NSS, PB13 SCK, PB14 MISO, PB15 MOSI
//! - PA0 user button (trigger), PA5 red LED (fault), PB4 green LED
//!   (success)

use stm32l0::stm32l0x3 as pac;

use antiphon_core::traits::{ByteLink, IndicatorPin};

// RCC enable bits
const IOPENR_IOPAEN: u32 = 1 << 0;
const IOPENR_IOPBEN: u32 = 1 << 1;
const APB1ENR_SPI2EN: u32 = 1 << 14;
const APB2ENR_SYSCFGEN: u32 = 1 << 0;
const APB2ENR_SPI1EN: u32 = 1 << 12;

// SPI register bits
const CR1_MSTR: u32 = 1 << 2;
const CR1_BR_DIV256: u32 = 0b111 << 3;
const CR1_SPE: u32 = 1 << 6;
const CR2_SSOE: u32 = 1 << 2;
const CR2_RXNEIE: u32 = 1 << 6;
const SR_RXNE: u32 = 1 << 0;
const SR_TXE: u32 = 1 << 1;

/// Configure PA5 (red) and PB4 (green) as push-pull outputs
pub fn configure_leds(dp: &pac::Peripherals) {
    dp.RCC
        .iopenr()
        .modify(|r, w| unsafe { w.bits(r.bits() | IOPENR_IOPAEN | IOPENR_IOPBEN) });
    // PA5 output (01)
    dp.GPIOA
        .moder()
        .modify(|r, w| unsafe { w.bits((r.bits() & !(0b11 << 10)) | (0b01 << 10)) });
    // PB4 output (01)
    dp.GPIOB
        .moder()
        .modify(|r, w| unsafe { w.bits((r.bits() & !(0b11 << 8)) | (0b01 << 8)) });
}

/// Configure the SPI1 pins and SPI1 itself as the master side
///
/// Slowest bit rate (Fpclk/256), CPOL/CPHA zero, 8-bit frames, slave
/// select output enabled, receive interrupt armed.
pub fn configure_spi1(dp: &pac::Peripherals) {
    dp.RCC
        .iopenr()
        .modify(|r, w| unsafe { w.bits(r.bits() | IOPENR_IOPAEN | IOPENR_IOPBEN) });

    // PA4, PA6, PA7 to alternate function (10), AF0 carries the SPI1 signals
    dp.GPIOA.moder().modify(|r, w| unsafe {
        w.bits(
            (r.bits() & !((0b11 << 8) | (0b11 << 12) | (0b11 << 14)))
                | ((0b10 << 8) | (0b10 << 12) | (0b10 << 14)),
        )
    });
    dp.GPIOA
        .afrl()
        .modify(|r, w| unsafe { w.bits(r.bits() & !((0xF << 16) | (0xF << 24) | (0xF << 28))) });
    // PB3 to alternate function (10), AF0
    dp.GPIOB
        .moder()
        .modify(|r, w| unsafe { w.bits((r.bits() & !(0b11 << 6)) | (0b10 << 6)) });
    dp.GPIOB
        .afrl()
        .modify(|r, w| unsafe { w.bits(r.bits() & !(0xF << 12)) });

    dp.RCC
        .apb2enr()
        .modify(|r, w| unsafe { w.bits(r.bits() | APB2ENR_SPI1EN) });
    dp.SPI1
        .cr1()
        .write(|w| unsafe { w.bits(CR1_MSTR | CR1_BR_DIV256) });
    dp.SPI1
        .cr2()
        .write(|w| unsafe { w.bits(CR2_SSOE | CR2_RXNEIE) });
    dp.SPI1
        .cr1()
        .modify(|r, w| unsafe { w.bits(r.bits() | CR1_SPE) });
}

/// Configure the SPI2 pins and SPI2 itself as the slave side
///
/// Hardware slave select, CPOL/CPHA zero, 8-bit frames, receive
/// interrupt armed.
pub fn configure_spi2(dp: &pac::Peripherals) {
    dp.RCC
        .iopenr()
        .modify(|r, w| unsafe { w.bits(r.bits() | IOPENR_IOPBEN) });

    // PB12..PB15 to alternate function (10), AF0 carries the SPI2 signals
    dp.GPIOB.moder().modify(|r, w| unsafe {
        w.bits(
            (r.bits() & !((0b11 << 24) | (0b11 << 26) | (0b11 << 28) | (0b11 << 30)))
                | ((0b10 << 24) | (0b10 << 26) | (0b10 << 28) | (0b10 << 30)),
        )
    });
    dp.GPIOB.afrh().modify(|r, w| unsafe {
        w.bits(r.bits() & !((0xF << 16) | (0xF << 20) | (0xF << 24) | (0xF << 28)))
    });

    dp.RCC
        .apb1enr()
        .modify(|r, w| unsafe { w.bits(r.bits() | APB1ENR_SPI2EN) });
    dp.SPI2.cr2().write(|w| unsafe { w.bits(CR2_RXNEIE) });
    dp.SPI2
        .cr1()
        .modify(|r, w| unsafe { w.bits(r.bits() | CR1_SPE) });
}

/// Configure PA0 as the trigger input with a rising-edge EXTI line
pub fn configure_trigger(dp: &pac::Peripherals) {
    dp.RCC
        .iopenr()
        .modify(|r, w| unsafe { w.bits(r.bits() | IOPENR_IOPAEN) });
    dp.RCC
        .apb2enr()
        .modify(|r, w| unsafe { w.bits(r.bits() | APB2ENR_SYSCFGEN) });

    // PA0 input (00)
    dp.GPIOA
        .moder()
        .modify(|r, w| unsafe { w.bits(r.bits() & !0b11) });

    // Port A as the EXTI0 source, unmask line 0, rising edge
    dp.SYSCFG
        .exticr1()
        .modify(|r, w| unsafe { w.bits(r.bits() & !0xF) });
    dp.EXTI
        .imr()
        .modify(|r, w| unsafe { w.bits(r.bits() | 1) });
    dp.EXTI
        .rtsr()
        .modify(|r, w| unsafe { w.bits(r.bits() | 1) });
}

/// Fault indicator: red LED on PA5
pub struct FaultLed;

impl IndicatorPin for FaultLed {
    fn set_high(&mut self) {
        let gpio = unsafe { &*pac::GPIOA::ptr() };
        gpio.bsrr().write(|w| unsafe { w.bits(1 << 5) });
    }

    fn set_low(&mut self) {
        let gpio = unsafe { &*pac::GPIOA::ptr() };
        gpio.bsrr().write(|w| unsafe { w.bits(1 << (5 + 16)) });
    }

    fn toggle(&mut self) {
        let gpio = unsafe { &*pac::GPIOA::ptr() };
        gpio.odr()
            .modify(|r, w| unsafe { w.bits(r.bits() ^ (1 << 5)) });
    }

    fn is_set_high(&self) -> bool {
        let gpio = unsafe { &*pac::GPIOA::ptr() };
        gpio.odr().read().bits() & (1 << 5) != 0
    }
}

/// Success indicator: green LED on PB4
pub struct SuccessLed;

impl IndicatorPin for SuccessLed {
    fn set_high(&mut self) {
        let gpio = unsafe { &*pac::GPIOB::ptr() };
        gpio.bsrr().write(|w| unsafe { w.bits(1 << 4) });
    }

    fn set_low(&mut self) {
        let gpio = unsafe { &*pac::GPIOB::ptr() };
        gpio.bsrr().write(|w| unsafe { w.bits(1 << (4 + 16)) });
    }

    fn toggle(&mut self) {
        let gpio = unsafe { &*pac::GPIOB::ptr() };
        gpio.odr()
            .modify(|r, w| unsafe { w.bits(r.bits() ^ (1 << 4)) });
    }

    fn is_set_high(&self) -> bool {
        let gpio = unsafe { &*pac::GPIOB::ptr() };
        gpio.odr().read().bits() & (1 << 4) != 0
    }
}

/// Master side of the loopback pair (SPI1)
pub struct MasterLink;

impl ByteLink for MasterLink {
    fn ready_to_send(&self) -> bool {
        let spi = unsafe { &*pac::SPI1::ptr() };
        spi.sr().read().bits() & SR_TXE != 0
    }

    fn send(&mut self, byte: u8) {
        let spi = unsafe { &*pac::SPI1::ptr() };
        // Byte access: a full-word write would push two frames through
        // the transmit FIFO.
        let dr = spi.dr().as_ptr() as *mut u8;
        unsafe { dr.write_volatile(byte) };
    }

    fn take_received(&mut self) -> Option<u8> {
        let spi = unsafe { &*pac::SPI1::ptr() };
        if spi.sr().read().bits() & SR_RXNE != 0 {
            let dr = spi.dr().as_ptr() as *const u8;
            Some(unsafe { dr.read_volatile() })
        } else {
            None
        }
    }
}

/// Slave side of the loopback pair (SPI2)
pub struct SlaveLink;

impl ByteLink for SlaveLink {
    fn ready_to_send(&self) -> bool {
        let spi = unsafe { &*pac::SPI2::ptr() };
        spi.sr().read().bits() & SR_TXE != 0
    }

    fn send(&mut self, byte: u8) {
        let spi = unsafe { &*pac::SPI2::ptr() };
        let dr = spi.dr().as_ptr() as *mut u8;
        unsafe { dr.write_volatile(byte) };
    }

    fn take_received(&mut self) -> Option<u8> {
        let spi = unsafe { &*pac::SPI2::ptr() };
        if spi.sr().read().bits() & SR_RXNE != 0 {
            let dr = spi.dr().as_ptr() as *const u8;
            Some(unsafe { dr.read_volatile() })
        } else {
            None
        }
    }
}
