pub mod codec;

// Публичный экспорт всех типов ошибок из вложенных модулей.
pub use codec::*;
