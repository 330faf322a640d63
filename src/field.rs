//! Known employee columns.
//!
//! Source files carry Arabic column labels; `Field` is the enumerated allow-list
//! used whenever code needs to act on a specific column.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    EmployeeNumber,
    ArabicName,
    EnglishName,
    CivilId,
    CivilIdExpiry,
    Nationality,
    PassportNumber,
    PassportExpiry,
    UnifiedNumber,
    ContractDate,
    ContractStatus,
    WorkSite,
    JobTitle,
    WorkSchedule,
    CurrentSalary,
    WorkPermitSalary,
    CompanyName,
    AdminNotes,
    AdditionalNotes,
}

impl Field {
    pub const ALL: &'static [Field] = &[
        Field::EmployeeNumber,
        Field::ArabicName,
        Field::EnglishName,
        Field::CivilId,
        Field::CivilIdExpiry,
        Field::Nationality,
        Field::PassportNumber,
        Field::PassportExpiry,
        Field::UnifiedNumber,
        Field::ContractDate,
        Field::ContractStatus,
        Field::WorkSite,
        Field::JobTitle,
        Field::WorkSchedule,
        Field::CurrentSalary,
        Field::WorkPermitSalary,
        Field::CompanyName,
        Field::AdminNotes,
        Field::AdditionalNotes,
    ];

    /// Columns rewritten to the canonical date form during normalization.
    pub const DATES: &'static [Field] = &[
        Field::CivilIdExpiry,
        Field::PassportExpiry,
        Field::ContractDate,
    ];

    /// Columns that must be non-blank before a record is added or updated.
    pub const REQUIRED: &'static [Field] = &[
        Field::EmployeeNumber,
        Field::ArabicName,
        Field::EnglishName,
        Field::CivilId,
        Field::CivilIdExpiry,
        Field::Nationality,
        Field::ContractDate,
        Field::ContractStatus,
        Field::JobTitle,
        Field::WorkSchedule,
        Field::CurrentSalary,
    ];

    /// Column label as it appears in source files.
    pub const fn label(self) -> &'static str {
        match self {
            Field::EmployeeNumber => "رقم الموظف",
            Field::ArabicName => "اسم الموظف باللغة العربية",
            Field::EnglishName => "اسم الموظف باللغة الإنجليزية",
            Field::CivilId => "البطاقة المدنية",
            Field::CivilIdExpiry => "تاريخ انتهاء البطاقة",
            Field::Nationality => "الجنسية",
            Field::PassportNumber => "رقم جواز السفر",
            Field::PassportExpiry => "تاريخ انتهاء الجواز",
            Field::UnifiedNumber => "الرقم الموحد",
            Field::ContractDate => "تاريخ التعاقد",
            Field::ContractStatus => "حالة التعاقد",
            Field::WorkSite => "موقع العمل",
            Field::JobTitle => "المهنة",
            Field::WorkSchedule => "نظام الدوام",
            Field::CurrentSalary => "الراتب الحالي للموظف",
            Field::WorkPermitSalary => "الراتب حسب اذن العمل",
            Field::CompanyName => "اسم الشركة",
            Field::AdminNotes => "ملاحظات إدارية",
            Field::AdditionalNotes => "اضافات اخرى",
        }
    }

    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL.iter().copied().find(|f| f.label() == label)
    }

    pub fn is_date(self) -> bool {
        Field::DATES.contains(&self)
    }

    pub fn is_required(self) -> bool {
        Field::REQUIRED.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Contract status value counted as active.
pub const ACTIVE_STATUS: &str = "نشط";
