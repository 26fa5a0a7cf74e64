//! Bundled record layouts and consolidation groups for the EFD blocks
//! A, C, D, E, F and M.

use crate::schema::group::ConsolidationGroup;
use crate::schema::layout::RecordLayout;

type LayoutRow = (&'static str, &'static [&'static str], &'static [&'static str]);

const LAYOUTS: &[LayoutRow] = &[
    // Block C
    ("C010", &["REG", "CNPJ", "IND_ESCRI"], &[]),
    (
        "C100",
        &[
            "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "NUM_DOC",
            "CHV_NFE", "DT_DOC", "DT_E_S", "VL_DOC", "IND_PGTO", "VL_DESC", "VL_ABAT_NT",
            "VL_MERC", "IND_FRT", "VL_FRT", "VL_SEG", "VL_OUT_DA", "VL_BC_ICMS", "VL_ICMS",
            "VL_BC_ICMS_ST", "VL_ICMS_ST", "VL_IPI", "VL_PIS", "VL_COFINS", "VL_PIS_ST",
            "VL_COFINS_ST",
        ],
        &[
            "VL_DOC", "VL_DESC", "VL_ABAT_NT", "VL_MERC", "VL_FRT", "VL_SEG", "VL_OUT_DA",
            "VL_BC_ICMS", "VL_ICMS", "VL_BC_ICMS_ST", "VL_ICMS_ST", "VL_IPI", "VL_PIS",
            "VL_COFINS", "VL_PIS_ST", "VL_COFINS_ST",
        ],
    ),
    (
        "C170",
        &[
            "REG", "NUM_ITEM", "COD_ITEM", "DESCR_COMPL", "QTD", "UNID", "VL_ITEM", "VL_DESC",
            "IND_MOV", "CST_ICMS", "CFOP", "COD_NAT", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS",
            "VL_BC_ICMS_ST", "ALIQ_ST", "VL_ICMS_ST", "IND_APUR", "CST_IPI", "COD_ENQ",
            "VL_BC_IPI", "ALIQ_IPI", "VL_IPI", "CST_PIS", "VL_BC_PIS", "ALIQ_PIS",
            "QUANT_BC_PIS", "ALIQ_PIS_QUANT", "VL_PIS", "CST_COFINS", "VL_BC_COFINS",
            "ALIQ_COFINS", "QUANT_BC_COFINS", "ALIQ_COFINS_QUANT", "VL_COFINS", "COD_CTA",
        ],
        &[
            "QTD", "VL_ITEM", "VL_DESC", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS", "VL_BC_ICMS_ST",
            "ALIQ_ST", "VL_ICMS_ST", "VL_BC_IPI", "ALIQ_IPI", "VL_IPI", "VL_BC_PIS", "ALIQ_PIS",
            "QUANT_BC_PIS", "ALIQ_PIS_QUANT", "VL_PIS", "VL_BC_COFINS", "ALIQ_COFINS",
            "QUANT_BC_COFINS", "ALIQ_COFINS_QUANT", "VL_COFINS",
        ],
    ),
    (
        "C190",
        &[
            "REG", "CST_ICMS", "CFOP", "ALIQ_ICMS", "VL_OPR", "VL_BC_ICMS", "VL_ICMS",
            "VL_BC_ICMS_ST", "VL_ICMS_ST", "VL_RED_BC", "VL_IPI", "COD_OBS",
        ],
        &[
            "ALIQ_ICMS", "VL_OPR", "VL_BC_ICMS", "VL_ICMS", "VL_BC_ICMS_ST", "VL_ICMS_ST",
            "VL_RED_BC", "VL_IPI",
        ],
    ),
    ("C195", &["REG", "COD_OBS", "TXT_COMPL"], &[]),
    (
        "C197",
        &[
            "REG", "COD_AJ", "DESCR_COMPL_AJ", "COD_ITEM", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS",
            "VL_OUTROS",
        ],
        &["VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS", "VL_OUTROS"],
    ),
    (
        "C500",
        &[
            "REG", "COD_PART", "COD_MOD", "COD_SIT", "SER", "SUB", "NUM_DOC", "DT_DOC", "DT_ENT",
            "VL_DOC", "VL_ICMS", "COD_INF", "VL_PIS", "VL_COFINS", "CHV_DOCe",
        ],
        &["VL_DOC", "VL_ICMS", "VL_PIS", "VL_COFINS"],
    ),
    (
        "C501",
        &[
            "REG", "CST_PIS", "VL_ITEM", "NAT_BC_CRED", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS",
            "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS"],
    ),
    (
        "C505",
        &[
            "REG", "CST_COFINS", "VL_ITEM", "NAT_BC_CRED", "VL_BC_COFINS", "ALIQ_COFINS",
            "VL_COFINS", "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_COFINS", "ALIQ_COFINS", "VL_COFINS"],
    ),
    // Block D
    ("D010", &["REG", "CNPJ"], &[]),
    (
        "D100",
        &[
            "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "SUB",
            "NUM_DOC", "CHV_CTE", "DT_DOC", "DT_A_P", "TP_CT_E", "CHV_CTE_REF", "VL_DOC",
            "VL_DESC", "IND_FRT", "VL_SERV", "VL_BC_ICMS", "VL_ICMS", "VL_NT", "COD_INF",
            "COD_CTA", "COD_MUN_ORIG", "COD_MUN_DEST",
        ],
        &["VL_DOC", "VL_DESC", "VL_SERV", "VL_BC_ICMS", "VL_ICMS", "VL_NT"],
    ),
    (
        "D170",
        &[
            "REG", "COD_ITEM", "DESCR_COMPL", "QTD", "UNID", "VL_ITEM", "VL_DESC", "IND_MOV",
            "CST_ICMS", "CFOP", "COD_NAT", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS", "VL_BC_ICMS_ST",
            "ALIQ_ST", "VL_ICMS_ST", "IND_APUR", "COD_CTA",
        ],
        &[
            "QTD", "VL_ITEM", "VL_DESC", "VL_BC_ICMS", "ALIQ_ICMS", "VL_ICMS", "VL_BC_ICMS_ST",
            "ALIQ_ST", "VL_ICMS_ST",
        ],
    ),
    (
        "D190",
        &[
            "REG", "CST_ICMS", "CFOP", "ALIQ_ICMS", "VL_OPR", "VL_BC_ICMS", "VL_ICMS",
            "VL_RED_BC", "COD_OBS",
        ],
        &["ALIQ_ICMS", "VL_OPR", "VL_BC_ICMS", "VL_ICMS", "VL_RED_BC"],
    ),
    (
        "D101",
        &[
            "REG", "IND_NAT_FRT", "VL_ITEM", "CST_PIS", "NAT_BC_CRED", "VL_BC_PIS", "ALIQ_PIS",
            "VL_PIS", "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS"],
    ),
    (
        "D105",
        &[
            "REG", "IND_NAT_FRT", "VL_ITEM", "CST_COFINS", "NAT_BC_CRED", "VL_BC_COFINS",
            "ALIQ_COFINS", "VL_COFINS", "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_COFINS", "ALIQ_COFINS", "VL_COFINS"],
    ),
    (
        "D500",
        &[
            "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "SUB",
            "NUM_DOC", "DT_DOC", "DT_A_P", "VL_DOC", "VL_DESC", "VL_SERV", "VL_SERV_NT",
            "VL_TERC", "VL_DA", "VL_BC_ICMS", "VL_ICMS", "COD_INF", "VL_PIS", "VL_COFINS",
            "CHV_DOCe",
        ],
        &[
            "VL_DOC", "VL_DESC", "VL_SERV", "VL_SERV_NT", "VL_TERC", "VL_DA", "VL_BC_ICMS",
            "VL_ICMS", "VL_PIS", "VL_COFINS",
        ],
    ),
    (
        "D501",
        &[
            "REG", "CST_PIS", "VL_ITEM", "NAT_BC_CRED", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS",
            "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS"],
    ),
    (
        "D505",
        &[
            "REG", "CST_COFINS", "VL_ITEM", "NAT_BC_CRED", "VL_BC_COFINS", "ALIQ_COFINS",
            "VL_COFINS", "COD_CTA",
        ],
        &["VL_ITEM", "VL_BC_COFINS", "ALIQ_COFINS", "VL_COFINS"],
    ),
    (
        "D700",
        &[
            "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_MOD", "COD_SIT", "SER", "NUM_DOC",
            "DT_DOC", "DT_E_S", "VL_DOC", "VL_DESC", "VL_SERV", "VL_SERV_NT", "VL_TERC", "VL_DA",
            "VL_BC_ICMS", "VL_ICMS", "COD_INF", "VL_PIS", "VL_COFINS", "CHV_DOCe", "FIN_DOCe",
            "TIP_FAT", "COD_MOD_DOC_REF", "CHV_DOCe_REF", "HASH_DOC_REF", "SER_DOC_REF",
            "NUM_DOC_REF", "MES_DOC_REF", "COD_MUN_DEST", "DED",
        ],
        &[
            "VL_DOC", "VL_DESC", "VL_SERV", "VL_SERV_NT", "VL_TERC", "VL_DA", "VL_BC_ICMS",
            "VL_ICMS", "VL_PIS", "VL_COFINS", "DED",
        ],
    ),
    // Block A
    ("A001", &["REG", "IND_MOV"], &[]),
    ("A010", &["REG", "CNPJ"], &[]),
    (
        "A100",
        &[
            "REG", "IND_OPER", "IND_EMIT", "COD_PART", "COD_SIT", "SER", "SUB", "NUM_DOC",
            "CHV_NFSE", "DT_DOC", "DT_EXE_SERV", "VL_DOC", "IND_PGTO", "VL_DESC", "VL_BC_PIS",
            "VL_PIS", "VL_BC_COFINS", "VL_COFINS", "VL_PIS_RET", "VL_COFINS_RET", "VL_ISS",
        ],
        &[
            "VL_DOC", "VL_DESC", "VL_BC_PIS", "VL_PIS", "VL_BC_COFINS", "VL_COFINS",
            "VL_PIS_RET", "VL_COFINS_RET", "VL_ISS",
        ],
    ),
    // Block F
    ("F001", &["REG", "IND_MOV"], &[]),
    ("F010", &["REG", "CNPJ"], &[]),
    (
        "F100",
        &[
            "REG", "IND_OPER", "COD_PART", "COD_ITEM", "DT_OPER", "VL_OPER", "CST_PIS",
            "VL_BC_PIS", "ALIQ_PIS", "VL_PIS", "CST_COFINS", "VL_BC_COFINS", "ALIQ_COFINS",
            "VL_COFINS", "NAT_BC_CRED", "IND_ORIG_CRED", "COD_CTA", "COD_CCUS", "DESC_COMPL",
        ],
        &[
            "VL_OPER", "VL_BC_PIS", "ALIQ_PIS", "VL_PIS", "VL_BC_COFINS", "ALIQ_COFINS",
            "VL_COFINS",
        ],
    ),
    ("F111", &["REG", "NUM_PROC", "IND_PROC"], &[]),
    // Block M
    ("M001", &["REG", "IND_MOV"], &[]),
    (
        "M100",
        &[
            "REG", "COD_CRED", "IND_CRED_ORI", "VL_BC_PIS", "ALIQ_PIS", "QUANT_BC_PIS",
            "ALIQ_PIS_QUANT", "VL_CRED", "VL_AJUS_ACRES", "VL_AJUS_REDUC", "VL_CRED_DIF",
            "VL_CRED_DISP", "IND_DESC_CRED", "VL_CRED_DESC", "SLD_CRED",
        ],
        &[
            "VL_BC_PIS", "ALIQ_PIS", "QUANT_BC_PIS", "ALIQ_PIS_QUANT", "VL_CRED",
            "VL_AJUS_ACRES", "VL_AJUS_REDUC", "VL_CRED_DIF", "VL_CRED_DISP", "VL_CRED_DESC",
            "SLD_CRED",
        ],
    ),
    (
        "M105",
        &[
            "REG", "NAT_BC_CRED", "CST_PIS", "VL_BC_PIS_TOT", "VL_BC_PIS_CUM", "VL_BC_PIS_NC",
            "VL_BC_PIS", "QUANT_BC_PIS_TOT", "QUANT_BC_PIS", "DESC_CRED",
        ],
        &[
            "VL_BC_PIS_TOT", "VL_BC_PIS_CUM", "VL_BC_PIS_NC", "VL_BC_PIS", "QUANT_BC_PIS_TOT",
            "QUANT_BC_PIS",
        ],
    ),
    (
        "M110",
        &["REG", "IND_AJ", "VL_AJ", "COD_AJ", "NUM_DOC", "DESCR_AJ", "DT_REF"],
        &["VL_AJ"],
    ),
    (
        "M115",
        &[
            "REG", "DET_VALOR_AJ", "CST_PIS", "DET_BC_CRED", "DET_ALIQ", "DT_OPER_AJ", "DESC_AJ",
            "COD_CTA", "INFO_COMPL",
        ],
        &["DET_VALOR_AJ", "DET_BC_CRED", "DET_ALIQ"],
    ),
    // Block E
    ("E001", &["REG", "IND_DAD"], &[]),
    ("E100", &["REG", "DT_INI", "DT_FIN"], &[]),
    (
        "E110",
        &[
            "REG", "VL_TOT_DEBITOS", "VL_AJ_DEBITOS", "VL_TOT_AJ_DEBITOS", "VL_ESTORNOS_CRED",
            "VL_TOT_CREDITOS", "VL_AJ_CREDITOS", "VL_TOT_AJ_CREDITOS", "VL_ESTORNOS_DEB",
            "VL_SLD_CREDOR_ANT", "VL_SLD_APURADO", "VL_TOT_DED", "VL_ICMS_RECOLHER",
            "VL_SLD_CREDOR_TRANSPORTAR", "DEB_ESP",
        ],
        &[
            "VL_TOT_DEBITOS", "VL_AJ_DEBITOS", "VL_TOT_AJ_DEBITOS", "VL_ESTORNOS_CRED",
            "VL_TOT_CREDITOS", "VL_AJ_CREDITOS", "VL_TOT_AJ_CREDITOS", "VL_ESTORNOS_DEB",
            "VL_SLD_CREDOR_ANT", "VL_SLD_APURADO", "VL_TOT_DED", "VL_ICMS_RECOLHER",
            "VL_SLD_CREDOR_TRANSPORTAR", "DEB_ESP",
        ],
    ),
    (
        "E111",
        &["REG", "COD_AJ_APUR", "DESCR_COMPL_AJ", "VL_AJ_APUR"],
        &["VL_AJ_APUR"],
    ),
    (
        "E112",
        &["REG", "NUM_DA", "NUM_PROC", "IND_PROC", "PROC", "COD_OBS"],
        &[],
    ),
    (
        "E113",
        &[
            "REG", "COD_PART", "COD_MOD", "SER", "SUB", "NUM_DOC", "DT_DOC", "COD_ITEM",
            "VL_AJ_ITEM", "CHV_DOCe",
        ],
        &["VL_AJ_ITEM"],
    ),
    (
        "E115",
        &["REG", "COD_INF_ADIC", "VL_INF_ADIC", "DESCR_COMPL_AJ"],
        &["VL_INF_ADIC"],
    ),
    (
        "E116",
        &[
            "REG", "COD_OR", "VL_OR", "DT_VCTO", "COD_REC", "NUM_PROC", "IND_PROC", "PROC",
            "TXT_COMPL", "MES_REF",
        ],
        &["VL_OR"],
    ),
];

type GroupRow = (
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static str,
    &'static str,
    &'static str,
);

// (name, parent, children, parent index, header index, header)
const GROUPS: &[GroupRow] = &[
    (
        "C",
        "C100",
        &["C170", "C190", "C195", "C197"],
        "C100_INDEX",
        "C010_INDEX",
        "C010",
    ),
    (
        "D",
        "D100",
        &["D170", "D190", "D101", "D105"],
        "D100_INDEX",
        "D010_INDEX",
        "D010",
    ),
    ("A", "A100", &[], "A100_INDEX", "A010_INDEX", "A010"),
    ("F", "F100", &["F111"], "F100_INDEX", "F010_INDEX", "F010"),
    (
        "E",
        "E110",
        &["E111", "E112", "E113", "E115", "E116"],
        "E110_INDEX",
        "E100_INDEX",
        "E100",
    ),
    (
        "C500",
        "C500",
        &["C501", "C505"],
        "C500_INDEX",
        "C010_INDEX",
        "C010",
    ),
    (
        "D500",
        "D500",
        &["D501", "D505"],
        "D500_INDEX",
        "D010_INDEX",
        "D010",
    ),
    ("D700", "D700", &[], "D700_INDEX", "D010_INDEX", "D010"),
];

/// Bundled record layouts
pub fn default_layouts() -> Vec<RecordLayout> {
    LAYOUTS
        .iter()
        .map(|(code, fields, numeric)| RecordLayout {
            code: code.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            numeric_fields: numeric.iter().map(|f| f.to_string()).collect(),
        })
        .collect()
}

/// Bundled consolidation groups, in output order
pub fn default_groups() -> Vec<ConsolidationGroup> {
    GROUPS
        .iter()
        .map(|(name, parent, children, parent_index, header_index, header)| {
            ConsolidationGroup::new(
                *name,
                *parent,
                children.iter().copied(),
                *parent_index,
                *header_index,
                *header,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_default_layout_is_valid() {
        let layouts = default_layouts();
        assert_eq!(layouts.len(), LAYOUTS.len());
        for layout in &layouts {
            layout.validate().unwrap();
            assert_eq!(layout.fields[0], "REG", "{} must start with REG", layout.code);
        }
    }

    #[test]
    fn test_c100_layout_shape() {
        let layouts = default_layouts();
        let c100 = layouts.iter().find(|l| l.code == "C100").unwrap();
        assert_eq!(c100.field_count(), 29);
        assert_eq!(c100.field_index("DT_DOC"), Some(9));
        assert!(c100.is_numeric("VL_DOC"));
        assert!(!c100.is_numeric("IND_OPER"));
    }
}
