uuid16_enum! {
    /// GATT service UUIDs ([Assigned Numbers] Section 3.4).
    pub enum Service {
        GenericAccess = 0x1800,
        GenericAttribute = 0x1801,
        DeviceInformation = 0x180A,
        Battery = 0x180F,
        CyclingSpeedAndCadence = 0x1816,
        CyclingPower = 0x1818,
    }
}

uuid16_enum! {
    /// Units ([Assigned Numbers] Section 3.5).
    pub enum Unit {
        Unitless = 0x2700,
        Second = 0x2703,
        Watt = 0x2726,
        RevolutionPerMinute = 0x27A7,
        Percentage = 0x27AD,
    }
}

uuid16_enum! {
    /// GATT attribute types ([Assigned Numbers] Section 3.6).
    pub enum Declaration {
        PrimaryService = 0x2800,
        SecondaryService = 0x2801,
        Include = 0x2802,
        Characteristic = 0x2803,
    }
}

uuid16_enum! {
    /// GATT characteristic descriptors ([Assigned Numbers] Section 3.7).
    pub enum Descriptor {
        CharacteristicExtendedProperties = 0x2900,
        CharacteristicUserDescription = 0x2901,
        ClientCharacteristicConfiguration = 0x2902,
        ServerCharacteristicConfiguration = 0x2903,
        CharacteristicPresentationFormat = 0x2904,
        CharacteristicAggregateFormat = 0x2905,
    }
}

uuid16_enum! {
    /// GATT characteristic UUIDs ([Assigned Numbers] Section 3.8).
    pub enum Characteristic {
        DeviceName = 0x2A00,
        Appearance = 0x2A01,
        BatteryLevel = 0x2A19,
        ModelNumberString = 0x2A24,
        SerialNumberString = 0x2A25,
        FirmwareRevisionString = 0x2A26,
        HardwareRevisionString = 0x2A27,
        SoftwareRevisionString = 0x2A28,
        ManufacturerNameString = 0x2A29,
        SensorLocation = 0x2A5D,
        CyclingPowerMeasurement = 0x2A63,
        CyclingPowerVector = 0x2A64,
        CyclingPowerFeature = 0x2A65,
        CyclingPowerControlPoint = 0x2A66,
    }
}
